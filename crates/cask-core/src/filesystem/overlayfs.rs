//! Overlay mounts for copy-on-write container filesystems.
//!
//! Layers the cached distro rootfs (read-only lower dir) under a
//! per-container writable upper dir, presenting the merged view at the
//! container's rootfs mountpoint.

use std::path::PathBuf;

use cask_common::error::Result;

/// Configuration for an overlay mount.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Read-only lower layer: the shared, extracted distro rootfs.
    pub lower_dir: PathBuf,
    /// Writable upper layer; all container writes land here.
    pub upper_dir: PathBuf,
    /// Scratch directory required by the overlay driver.
    pub work_dir: PathBuf,
    /// Final merged mount point.
    pub merged_dir: PathBuf,
}

impl OverlayConfig {
    /// Renders the `lowerdir=..,upperdir=..,workdir=..` mount data string.
    #[must_use]
    pub fn mount_options(&self) -> String {
        format!(
            "lowerdir={},upperdir={},workdir={}",
            self.lower_dir.display(),
            self.upper_dir.display(),
            self.work_dir.display()
        )
    }
}

/// Mounts an overlay filesystem with the given configuration.
///
/// Creates the upper, work, and merged directories if they do not exist,
/// then issues the `mount(2)` syscall with `MS_NODEV` set.
///
/// # Errors
///
/// Returns an error if directory creation or the mount syscall fails.
#[cfg(target_os = "linux")]
pub fn mount_overlay(config: &OverlayConfig) -> Result<()> {
    use cask_common::error::CaskError;
    use nix::mount::{mount, MsFlags};

    for dir in [&config.upper_dir, &config.work_dir, &config.merged_dir] {
        std::fs::create_dir_all(dir).map_err(|e| CaskError::Io {
            path: dir.clone(),
            source: e,
        })?;
    }

    let opts = config.mount_options();
    mount(
        Some("overlay"),
        &config.merged_dir,
        Some("overlay"),
        MsFlags::MS_NODEV,
        Some(opts.as_str()),
    )
    .map_err(|e| CaskError::Syscall {
        op: "mount(overlay)",
        source: e,
    })?;

    tracing::info!(merged = %config.merged_dir.display(), "overlay mounted");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — overlay mounting requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn mount_overlay(_config: &OverlayConfig) -> Result<()> {
    Err(cask_common::error::CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_options_name_all_three_layers() {
        let config = OverlayConfig {
            lower_dir: "/srv/cask/cache/alpine/rootfs".into(),
            upper_dir: "/srv/cask/containers/testa/copy-on-write".into(),
            work_dir: "/srv/cask/containers/testa/work".into(),
            merged_dir: "/srv/cask/containers/testa/rootfs".into(),
        };
        assert_eq!(
            config.mount_options(),
            "lowerdir=/srv/cask/cache/alpine/rootfs,\
             upperdir=/srv/cask/containers/testa/copy-on-write,\
             workdir=/srv/cask/containers/testa/work"
        );
    }
}
