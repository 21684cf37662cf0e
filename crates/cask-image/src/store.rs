//! Distribution rootfs store.
//!
//! Downloads each distro's archive into `<root>/cache/<distro>/` the first
//! time it is needed and extracts it once into the shared lower dir. Every
//! existence check gates both the download and the extraction, so repeat
//! runs reuse the cache untouched.

use std::path::{Path, PathBuf};

use cask_common::error::{CaskError, Result};
use cask_common::layout::Layout;
use cask_common::types::Distro;
use cask_core::cmd;

/// Access to the cached distribution root filesystems under one layout.
#[derive(Debug, Clone)]
pub struct ImageStore {
    layout: Layout,
}

impl ImageStore {
    /// Creates a store over the given layout.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Ensures the distro's lower dir exists and returns its path.
    ///
    /// Downloads the archive unless cached, extracts it unless the lower
    /// dir was already populated by an earlier run.
    ///
    /// # Errors
    ///
    /// Fails if a directory cannot be created or the download or
    /// extraction subprocess fails.
    pub fn materialize(&self, distro: Distro) -> Result<PathBuf> {
        let archive = self.fetch_archive(distro)?;

        let lower = self.layout.lower_dir(distro);
        if !lower.exists() {
            create_dir(&lower)?;
            if let Err(e) = extract(&archive, &lower) {
                // Leave no half-extracted lower dir behind; the next run
                // must retry from scratch.
                let _ = std::fs::remove_dir_all(&lower);
                return Err(e);
            }
            tracing::info!(distro = %distro, lower = %lower.display(), "rootfs extracted");
        } else {
            tracing::debug!(distro = %distro, "reusing cached rootfs");
        }

        Ok(lower)
    }

    /// Extracts the distro's archive directly into the given rootfs dir.
    ///
    /// Build-image mode uses this instead of [`Self::materialize`] so the
    /// container runs on a concrete tree that can be archived afterwards.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::materialize`].
    pub fn extract_into(&self, distro: Distro, rootfs: &Path) -> Result<()> {
        let archive = self.fetch_archive(distro)?;
        create_dir(rootfs)?;
        extract(&archive, rootfs)?;
        tracing::info!(distro = %distro, rootfs = %rootfs.display(), "rootfs extracted");
        Ok(())
    }

    /// Ensures the distro's archive is cached and returns its path.
    fn fetch_archive(&self, distro: Distro) -> Result<PathBuf> {
        let cache = self.layout.cache_dir(distro);
        create_dir(&cache)?;

        let archive = self.layout.archive_path(distro);
        if archive.exists() {
            tracing::debug!(archive = %archive.display(), "archive already cached");
        } else {
            tracing::info!(url = distro.url(), "downloading rootfs archive");
            let target = archive.display().to_string();
            cmd::run(&[
                "wget",
                "-O",
                target.as_str(),
                distro.url(),
                "-q",
                "--show-progress",
            ])?;
        }
        Ok(archive)
    }
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| CaskError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let archive_arg = archive.display().to_string();
    let dest_arg = dest.display().to_string();
    cmd::run(&["tar", "xf", archive_arg.as_str(), "-C", dest_arg.as_str()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialize_reuses_existing_lower_dir() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(tmp.path());

        // A populated lower dir short-circuits both download and extract.
        let lower = layout.lower_dir(Distro::Alpine);
        std::fs::create_dir_all(lower.join("bin")).expect("mkdir");
        std::fs::write(layout.archive_path(Distro::Alpine), b"archive").expect("touch");

        let store = ImageStore::new(layout);
        let path = store.materialize(Distro::Alpine).expect("materialize");

        assert_eq!(path, lower);
        assert!(path.join("bin").is_dir());
    }

    #[test]
    fn materialize_creates_cache_dir_tree() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(tmp.path());
        std::fs::create_dir_all(layout.lower_dir(Distro::Ubuntu)).expect("mkdir");
        std::fs::write(layout.archive_path(Distro::Ubuntu), b"archive").expect("touch");

        ImageStore::new(layout.clone())
            .materialize(Distro::Ubuntu)
            .expect("materialize");

        assert!(layout.cache_dir(Distro::Ubuntu).is_dir());
    }

    #[test]
    fn cached_archive_skips_download() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(tmp.path());
        let archive = layout.archive_path(Distro::Centos);
        std::fs::create_dir_all(layout.cache_dir(Distro::Centos)).expect("mkdir");
        std::fs::write(&archive, b"cached bytes").expect("write");

        let store = ImageStore::new(layout);
        // wget is never reached; a hit would fail on the bogus URL host.
        let fetched = store.fetch_archive(Distro::Centos).expect("fetch");
        assert_eq!(fetched, archive);
        assert_eq!(std::fs::read(archive).expect("read"), b"cached bytes");
    }
}
