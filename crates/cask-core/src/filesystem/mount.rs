//! Mount operations performed inside the container's mount namespace.
//!
//! Ordering matters: the recursive-private remount of `/` must come before
//! any other mount so nothing propagates back to the host, and the
//! pseudo-filesystems are mounted only after the root switch.

use cask_common::error::Result;

/// Recursively marks `/` as a private mount.
///
/// Every mount the container performs afterwards stays invisible to the
/// host namespace.
///
/// # Errors
///
/// Returns an error if the remount syscall fails.
#[cfg(target_os = "linux")]
pub fn make_root_private() -> Result<()> {
    use cask_common::error::CaskError;
    use nix::mount::{mount, MsFlags};

    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(|e| CaskError::Syscall {
        op: "mount(private /)",
        source: e,
    })?;
    tracing::debug!("root marked private");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — mount propagation control requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn make_root_private() -> Result<()> {
    Err(cask_common::error::CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}

/// Mounts `proc`, `sysfs`, and a tmpfs `/dev` under the new root.
///
/// # Errors
///
/// Returns an error if any mount syscall fails.
#[cfg(target_os = "linux")]
pub fn mount_pseudo_filesystems() -> Result<()> {
    use cask_common::error::CaskError;
    use nix::mount::{mount, MsFlags};

    mount(
        Some("proc"),
        "/proc",
        Some("proc"),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| CaskError::Syscall {
        op: "mount(proc)",
        source: e,
    })?;

    mount(
        Some("sysfs"),
        "/sys",
        Some("sysfs"),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| CaskError::Syscall {
        op: "mount(sysfs)",
        source: e,
    })?;

    mount(
        Some("tmpfs"),
        "/dev",
        Some("tmpfs"),
        MsFlags::MS_NOSUID | MsFlags::MS_STRICTATIME,
        Some("mode=755"),
    )
    .map_err(|e| CaskError::Syscall {
        op: "mount(tmpfs /dev)",
        source: e,
    })?;

    tracing::debug!("proc, sys, dev mounted");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — pseudo-filesystems require Linux.
#[cfg(not(target_os = "linux"))]
pub fn mount_pseudo_filesystems() -> Result<()> {
    Err(cask_common::error::CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}

/// Mounts a fresh `devpts` instance at `/dev/pts`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the mount fails.
#[cfg(target_os = "linux")]
pub fn mount_devpts() -> Result<()> {
    use cask_common::error::CaskError;
    use nix::mount::{mount, MsFlags};

    std::fs::create_dir_all("/dev/pts").map_err(|e| CaskError::Io {
        path: "/dev/pts".into(),
        source: e,
    })?;

    mount(
        Some("devpts"),
        "/dev/pts",
        Some("devpts"),
        MsFlags::MS_NOSUID | MsFlags::MS_NOEXEC,
        Some("newinstance,ptmxmode=0666,mode=620,gid=5"),
    )
    .map_err(|e| CaskError::Syscall {
        op: "mount(devpts)",
        source: e,
    })?;

    tracing::debug!("devpts mounted");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — `devpts` requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn mount_devpts() -> Result<()> {
    Err(cask_common::error::CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}

/// Unmounts the pseudo-filesystems before the init process returns.
///
/// Best-effort: the mount namespace dies with the process anyway, so
/// failures are only logged.
#[cfg(target_os = "linux")]
pub fn unmount_pseudo_filesystems() {
    use nix::mount::{umount2, MntFlags};

    for target in ["/proc", "/sys", "/dev/pts", "/dev"] {
        if let Err(e) = umount2(target, MntFlags::MNT_DETACH) {
            tracing::debug!(target, error = %e, "unmount skipped");
        }
    }
}

/// Stub for non-Linux platforms.
#[cfg(not(target_os = "linux"))]
pub fn unmount_pseudo_filesystems() {}
