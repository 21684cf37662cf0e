//! Named network namespace registration.
//!
//! `ip netns add` creates the bind file under `/var/run/netns`; the
//! container init then bind-mounts its own `/proc/self/ns/net` over that
//! file so the parent's subsequent `ip` invocations resolve the name to
//! the child's namespace. The bind must happen before the child marks its
//! mount tree private, otherwise the mount never propagates to the host.

use std::path::PathBuf;

use cask_common::constants::NETNS_RUN_DIR;
use cask_common::error::Result;
use cask_common::types::ContainerId;

/// Returns the bind file path of a container's named network namespace.
#[must_use]
pub fn netns_path(id: &ContainerId) -> PathBuf {
    PathBuf::from(NETNS_RUN_DIR).join(id.as_str())
}

/// Bind-mounts the calling process's network namespace onto the named
/// entry created by `ip netns add`.
///
/// # Errors
///
/// Returns an error if the bind mount fails.
#[cfg(target_os = "linux")]
pub fn register_self(id: &ContainerId) -> Result<()> {
    use cask_common::error::CaskError;
    use nix::mount::{mount, MsFlags};

    let target = netns_path(id);
    mount(
        Some("/proc/self/ns/net"),
        &target,
        None::<&str>,
        MsFlags::MS_BIND,
        None::<&str>,
    )
    .map_err(|e| CaskError::Syscall {
        op: "mount(bind netns)",
        source: e,
    })?;
    tracing::debug!(netns = %target.display(), "network namespace registered");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — network namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn register_self(_id: &ContainerId) -> Result<()> {
    Err(cask_common::error::CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}

/// Unmounts the named network namespace entry on the host side.
///
/// `ip netns del` removes the file itself afterwards.
///
/// # Errors
///
/// Returns an error if the unmount fails.
#[cfg(target_os = "linux")]
pub fn unregister(id: &ContainerId) -> Result<()> {
    use cask_common::error::CaskError;
    use nix::mount::{umount2, MntFlags};

    let target = netns_path(id);
    umount2(&target, MntFlags::MNT_DETACH).map_err(|e| CaskError::Syscall {
        op: "umount2(netns)",
        source: e,
    })?;
    tracing::debug!(netns = %target.display(), "network namespace unregistered");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — network namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn unregister(_id: &ContainerId) -> Result<()> {
    Err(cask_common::error::CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netns_path_is_keyed_by_id() {
        let id = ContainerId::new("testa").expect("valid id");
        assert_eq!(netns_path(&id), PathBuf::from("/var/run/netns/testa"));
    }
}
