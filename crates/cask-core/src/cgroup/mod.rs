//! Cgroup v1 resource management.
//!
//! Creates one leaf directory per controller (`pids`, `memory`, `cpu`)
//! under the legacy hierarchy at `/sys/fs/cgroup`, keyed by container ID,
//! and removes them on teardown.

pub mod cpu;
pub mod memory;
pub mod pids;

use std::io::Write;
use std::path::{Path, PathBuf};

use cask_common::constants::CGROUP_ROOT;
use cask_common::error::{CaskError, Result};
use cask_common::types::{ContainerId, ResourceLimits};
use nix::errno::Errno;
use nix::unistd::Pid;

/// Controllers the engine manages, in application order.
const CONTROLLERS: [&str; 3] = ["pids", "memory", "cpu"];

/// Handle to the per-controller cgroup leaf directories of one container.
#[derive(Debug)]
pub struct CgroupSet {
    root: PathBuf,
    id: String,
}

impl CgroupSet {
    /// Creates a handle rooted at the host's cgroup v1 hierarchy.
    #[must_use]
    pub fn new(id: &ContainerId) -> Self {
        Self::with_root(CGROUP_ROOT, id)
    }

    /// Creates a handle rooted at an arbitrary hierarchy.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>, id: &ContainerId) -> Self {
        Self {
            root: root.into(),
            id: id.as_str().to_owned(),
        }
    }

    fn controller_dir(&self, controller: &str) -> PathBuf {
        self.root.join(controller).join(&self.id)
    }

    /// Creates the three leaf directories, writes the limits, and attaches
    /// the given process to each controller.
    ///
    /// # Errors
    ///
    /// Any directory creation or control-file write failure is fatal to
    /// the run.
    pub fn apply(&self, limits: &ResourceLimits, pid: Pid) -> Result<()> {
        for controller in CONTROLLERS {
            let dir = self.controller_dir(controller);
            std::fs::create_dir_all(&dir).map_err(|e| CaskError::Io {
                path: dir.clone(),
                source: e,
            })?;
        }

        pids::apply(&self.controller_dir("pids"), &limits.process_number, pid)?;
        memory::apply(
            &self.controller_dir("memory"),
            &limits.memory,
            &limits.memory_swap,
            pid,
        )?;
        cpu::apply(&self.controller_dir("cpu"), limits.cpu_shares, pid)?;

        tracing::info!(id = %self.id, "cgroup limits applied");
        Ok(())
    }

    /// Removes the three leaf directories.
    ///
    /// The kernel keeps a dying cgroup populated for a short while after its
    /// last task exits, so `EBUSY` and `ENOTEMPTY` are tolerated; a missing
    /// directory counts as already removed.
    ///
    /// # Errors
    ///
    /// Returns an error for any other removal failure.
    pub fn remove(&self) -> Result<()> {
        for controller in CONTROLLERS {
            let dir = self.controller_dir(controller);
            match std::fs::remove_dir(&dir) {
                Ok(()) => tracing::debug!(path = %dir.display(), "cgroup removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) if is_kernel_residual(&e) => {
                    tracing::debug!(path = %dir.display(), "cgroup left to kernel drain");
                }
                Err(e) => {
                    return Err(CaskError::Io {
                        path: dir,
                        source: e,
                    })
                }
            }
        }
        Ok(())
    }
}

fn is_kernel_residual(e: &std::io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(code) if code == Errno::EBUSY as i32 || code == Errno::ENOTEMPTY as i32
    )
}

/// Appends a single line to a cgroup control file.
pub(crate) fn write_control(dir: &Path, file: &str, value: &str) -> Result<()> {
    let path = dir.join(file);
    let mut handle = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| CaskError::Io {
            path: path.clone(),
            source: e,
        })?;
    writeln!(handle, "{value}").map_err(|e| CaskError::Io { path, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> ContainerId {
        ContainerId::new("testa").expect("valid id")
    }

    #[test]
    fn apply_creates_all_controller_dirs() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let set = CgroupSet::with_root(tmp.path(), &id());

        set.apply(&ResourceLimits::default(), Pid::from_raw(4242))
            .expect("apply");

        for controller in CONTROLLERS {
            assert!(tmp.path().join(controller).join("testa").is_dir());
        }
    }

    #[test]
    fn apply_attaches_pid_to_every_controller() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let set = CgroupSet::with_root(tmp.path(), &id());

        set.apply(&ResourceLimits::default(), Pid::from_raw(4242))
            .expect("apply");

        let procs = std::fs::read_to_string(tmp.path().join("pids/testa/cgroup.procs"))
            .expect("read cgroup.procs");
        assert_eq!(procs, "4242\n");
        for controller in ["memory", "cpu"] {
            let tasks = std::fs::read_to_string(
                tmp.path().join(controller).join("testa").join("tasks"),
            )
            .expect("read tasks");
            assert_eq!(tasks, "4242\n");
        }
    }

    #[test]
    fn remove_deletes_empty_leaf_dirs() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for controller in CONTROLLERS {
            std::fs::create_dir_all(tmp.path().join(controller).join("testa")).expect("mkdir");
        }

        let set = CgroupSet::with_root(tmp.path(), &id());
        set.remove().expect("remove");

        for controller in CONTROLLERS {
            assert!(!tmp.path().join(controller).join("testa").exists());
        }
    }

    #[test]
    fn remove_tolerates_populated_leaf_dir() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for controller in CONTROLLERS {
            let dir = tmp.path().join(controller).join("testa");
            std::fs::create_dir_all(&dir).expect("mkdir");
        }
        // A residual entry makes rmdir fail with ENOTEMPTY, as a draining
        // kernel cgroup does.
        std::fs::write(tmp.path().join("pids/testa/residual"), "1").expect("write");

        let set = CgroupSet::with_root(tmp.path(), &id());
        set.remove().expect("remove tolerates residual");
        assert!(tmp.path().join("pids/testa").exists());
        assert!(!tmp.path().join("cpu/testa").exists());
    }

    #[test]
    fn remove_of_absent_dirs_is_idempotent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let set = CgroupSet::with_root(tmp.path(), &id());
        set.remove().expect("nothing to remove");
    }
}
