//! Image building from a finished container rootfs.

use std::path::{Path, PathBuf};

use cask_common::error::{CaskError, Result};
use cask_common::layout::Layout;
use cask_common::types::ContainerId;
use cask_core::cmd;

/// Archives the container's rootfs into `<root>/images/<id>.tar.gz`.
///
/// Runs after the container exits when `--build` was given; the rootfs is
/// a concrete tree because build-image mode skips the overlay.
///
/// # Errors
///
/// Returns an error if the images directory cannot be created or the
/// `tar` subprocess fails.
pub fn build(layout: &Layout, id: &ContainerId, rootfs: &Path) -> Result<PathBuf> {
    let images = layout.images_dir();
    std::fs::create_dir_all(&images).map_err(|e| CaskError::Io {
        path: images,
        source: e,
    })?;

    let archive = layout.image_archive(id.as_str());
    let archive_arg = archive.display().to_string();
    let rootfs_arg = rootfs.display().to_string();
    cmd::run(&[
        "tar",
        "-czf",
        archive_arg.as_str(),
        "-C",
        rootfs_arg.as_str(),
        ".",
    ])?;

    tracing::info!(image = %archive.display(), "image built");
    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_archives_the_rootfs_tree() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(tmp.path());
        let id = ContainerId::new("testb").expect("valid id");

        let rootfs = tmp.path().join("rootfs");
        std::fs::create_dir_all(&rootfs).expect("mkdir");
        std::fs::write(rootfs.join("marker"), b"hi").expect("write");

        let archive = build(&layout, &id, &rootfs).expect("build");

        assert_eq!(archive, layout.image_archive("testb"));
        assert!(archive.exists());
        assert!(
            std::fs::metadata(&archive).expect("metadata").len() > 0,
            "archive should not be empty"
        );
    }
}
