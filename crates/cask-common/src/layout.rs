//! On-disk layout of all cask data under the root directory.
//!
//! ```text
//! <root>/cache/<distro>/<archive>      downloaded rootfs archives
//! <root>/cache/<distro>/rootfs/        extracted lower dirs, shared by runs
//! <root>/containers/<id>/              per-container overlay directories
//! <root>/images/<id>.tar.gz            images built with --build
//! <root>/logs/<id>.log                 per-run log files
//! ```

use std::path::{Path, PathBuf};

use crate::constants::{ROOTFS_DIR, UPPER_DIR, WORK_DIR};
use crate::types::{ContainerId, Distro};

/// Path arithmetic for everything cask stores under its root directory.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Creates a layout rooted at the given base directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the base directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the cache directory of a distribution.
    #[must_use]
    pub fn cache_dir(&self, distro: Distro) -> PathBuf {
        self.root.join("cache").join(distro.name())
    }

    /// Returns the path of a distribution's downloaded rootfs archive.
    #[must_use]
    pub fn archive_path(&self, distro: Distro) -> PathBuf {
        self.cache_dir(distro).join(distro.archive_name())
    }

    /// Returns the extracted lower dir shared by all runs of a distribution.
    #[must_use]
    pub fn lower_dir(&self, distro: Distro) -> PathBuf {
        self.cache_dir(distro).join(ROOTFS_DIR)
    }

    /// Returns the directory holding all per-container directories.
    #[must_use]
    pub fn containers_dir(&self) -> PathBuf {
        self.root.join("containers")
    }

    /// Returns a container's directory.
    #[must_use]
    pub fn container_dir(&self, id: &ContainerId) -> PathBuf {
        self.containers_dir().join(id.as_str())
    }

    /// Returns a container's writable overlay layer.
    #[must_use]
    pub fn upper_dir(&self, id: &ContainerId) -> PathBuf {
        self.container_dir(id).join(UPPER_DIR)
    }

    /// Returns a container's overlay scratch directory.
    #[must_use]
    pub fn work_dir(&self, id: &ContainerId) -> PathBuf {
        self.container_dir(id).join(WORK_DIR)
    }

    /// Returns a container's root filesystem directory.
    ///
    /// In overlay mode this is the merged mountpoint; in build-image mode the
    /// archive is extracted directly into it.
    #[must_use]
    pub fn rootfs_dir(&self, id: &ContainerId) -> PathBuf {
        self.container_dir(id).join(ROOTFS_DIR)
    }

    /// Returns the directory holding built images.
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    /// Returns the archive path of a built image.
    #[must_use]
    pub fn image_archive(&self, id: &str) -> PathBuf {
        self.images_dir().join(format!("{id}.tar.gz"))
    }

    /// Returns the directory holding per-run log files.
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Returns the log file of a run.
    #[must_use]
    pub fn log_file(&self, id: &ContainerId) -> PathBuf {
        self.logs_dir().join(format!("{id}.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new("/srv/cask")
    }

    fn id() -> ContainerId {
        ContainerId::new("testa").expect("valid id")
    }

    #[test]
    fn cache_paths_are_keyed_by_distro() {
        let l = layout();
        assert_eq!(
            l.cache_dir(Distro::Alpine),
            PathBuf::from("/srv/cask/cache/alpine")
        );
        assert_eq!(
            l.archive_path(Distro::Alpine),
            PathBuf::from("/srv/cask/cache/alpine/alpine-minirootfs-3.14.0-x86_64.tar.gz")
        );
        assert_eq!(
            l.lower_dir(Distro::Ubuntu),
            PathBuf::from("/srv/cask/cache/ubuntu/rootfs")
        );
    }

    #[test]
    fn container_paths_are_keyed_by_id() {
        let l = layout();
        assert_eq!(
            l.container_dir(&id()),
            PathBuf::from("/srv/cask/containers/testa")
        );
        assert_eq!(
            l.upper_dir(&id()),
            PathBuf::from("/srv/cask/containers/testa/copy-on-write")
        );
        assert_eq!(
            l.work_dir(&id()),
            PathBuf::from("/srv/cask/containers/testa/work")
        );
        assert_eq!(
            l.rootfs_dir(&id()),
            PathBuf::from("/srv/cask/containers/testa/rootfs")
        );
    }

    #[test]
    fn image_archive_has_tar_gz_suffix() {
        assert_eq!(
            layout().image_archive("testb"),
            PathBuf::from("/srv/cask/images/testb.tar.gz")
        );
    }

    #[test]
    fn log_file_lives_under_logs_dir() {
        assert_eq!(
            layout().log_file(&id()),
            PathBuf::from("/srv/cask/logs/testa.log")
        );
    }
}
