//! Cloning the container init process and collecting its exit status.

use cask_common::error::{CaskError, Result};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;

/// Clones the init process into fresh pid/uts/mount/net namespaces.
///
/// The callback runs as the child's entry point on a dedicated 64 KiB
/// stack; its return value becomes the child's exit status.
///
/// # Errors
///
/// Returns an error if `clone(2)` fails.
#[cfg(target_os = "linux")]
pub fn spawn_init<F>(child: F) -> Result<Pid>
where
    F: FnMut() -> isize,
{
    use cask_common::constants::CHILD_STACK_SIZE;
    use nix::sched::{clone, CloneFlags};

    let mut stack = vec![0u8; CHILD_STACK_SIZE];
    let flags = CloneFlags::CLONE_NEWPID
        | CloneFlags::CLONE_NEWUTS
        | CloneFlags::CLONE_NEWNS
        | CloneFlags::CLONE_NEWNET;

    // SAFETY: the child callback only touches data moved into it, the
    // stack buffer outlives the clone call, and the child never returns
    // into the parent's frames.
    let pid = unsafe {
        clone(
            Box::new(child),
            &mut stack,
            flags,
            Some(nix::libc::SIGCHLD),
        )
    }
    .map_err(|e| CaskError::Syscall {
        op: "clone",
        source: e,
    })?;

    tracing::info!(pid = pid.as_raw(), "container init cloned");
    Ok(pid)
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — namespace cloning requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn spawn_init<F>(_child: F) -> Result<Pid>
where
    F: FnMut() -> isize,
{
    Err(CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}

/// Blocks until the child terminates and returns its exit code.
///
/// A child killed by a signal reports `128 + signo`, mirroring the shell
/// convention.
///
/// # Errors
///
/// Returns an error if `waitpid(2)` fails.
pub fn wait_for_exit(pid: Pid) -> Result<i32> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                tracing::warn!(%signal, "container init killed by signal");
                return Ok(128 + signal as i32);
            }
            Ok(_) => {}
            Err(e) => {
                return Err(CaskError::Syscall {
                    op: "waitpid",
                    source: e,
                })
            }
        }
    }
}
