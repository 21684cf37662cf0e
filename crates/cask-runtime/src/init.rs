//! The container init sequence.
//!
//! Runs as the entry point of the cloned process, inside fresh
//! pid/uts/mount/net namespaces but still on the host's root filesystem.
//! Ordering is load-bearing:
//!
//! - the netns bind mount precedes the recursive-private remount of `/`,
//!   because the bind must propagate to the host for the parent's `ip`
//!   invocations to resolve the namespace by name;
//! - every other mount follows the private remount so nothing else leaks;
//! - cgroup entry precedes the root switch (the host hierarchy is still
//!   visible) and therefore precedes the exec;
//! - the exec waits for the parent's final handoff message so the network
//!   is fully up before the user command runs.

use std::io::Write;
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};

use cask_common::constants::CONTAINER_PATH;
use cask_common::error::{CaskError, Result};
use cask_common::types::{ContainerId, ResourceLimits};
use cask_core::cgroup::CgroupSet;
use cask_core::filesystem::{devices, mount, overlayfs, pivot_root};
use cask_core::filesystem::overlayfs::OverlayConfig;
use cask_core::namespace::{netns, uts};

use crate::sync::{self, ChildHandoff};

/// Everything the init process needs, assembled by the orchestrator
/// before the clone.
#[derive(Debug)]
pub struct InitConfig {
    /// Container identity; doubles as netns name and hostname.
    pub id: ContainerId,
    /// Root filesystem directory: the merged overlay mountpoint, or the
    /// extraction target in build-image mode.
    pub rootfs: PathBuf,
    /// Overlay layers; `None` selects build-image mode (plain chroot).
    pub overlay: Option<OverlayConfig>,
    /// Cgroup limits applied with the child's own pid.
    pub limits: ResourceLimits,
    /// Shell command to execute.
    pub command: String,
    /// Nameserver appended to the container's `/etc/resolv.conf`.
    pub nameserver: String,
    /// Child half of the rendezvous, dissolved into raw descriptors so
    /// the parent keeps no owned copy across the clone.
    pub child_fds: [RawFd; 2],
    /// Parent-half descriptors inherited across the clone, closed first.
    pub host_fds: [RawFd; 2],
}

/// Entry point of the cloned process; the return value is its exit status.
pub fn run(config: InitConfig) -> isize {
    sync::close_inherited(&config.host_fds);
    match contain_and_execute(config) {
        Ok(code) => code as isize,
        Err(e) => {
            tracing::error!(error = %e, "container init failed");
            1
        }
    }
}

fn contain_and_execute(config: InitConfig) -> Result<i32> {
    let pid = nix::unistd::getpid();

    // SAFETY: the descriptors come from ChildHandoff::into_raw_fds in the
    // parent, and this copy of the descriptor table owns them exclusively.
    let mut handoff = unsafe { ChildHandoff::from_raw_fds(config.child_fds) };

    handoff.wait_netns_created()?;
    netns::register_self(&config.id)?;
    handoff.confirm_netns_registered()?;

    CgroupSet::new(&config.id).apply(&config.limits, pid)?;

    mount::make_root_private()?;
    match &config.overlay {
        Some(overlay) => {
            overlayfs::mount_overlay(overlay)?;
            pivot_root::pivot_root(&overlay.merged_dir)?;
        }
        None => pivot_root::enter_chroot(&config.rootfs)?,
    }

    mount::mount_pseudo_filesystems()?;
    mount::mount_devpts()?;
    devices::create_fd_symlinks()?;
    devices::create_device_nodes()?;

    reset_environment();
    append_nameserver(Path::new("/etc/resolv.conf"), &config.nameserver)?;
    uts::set_hostname(config.id.as_str())?;

    handoff.wait_network_configured()?;

    let code = execute(&config.command);
    mount::unmount_pseudo_filesystems();
    code
}

/// Clears the inherited host environment and installs the container's.
fn reset_environment() {
    let keys: Vec<_> = std::env::vars_os().map(|(key, _)| key).collect();
    for key in keys {
        std::env::remove_var(key);
    }
    std::env::set_var("HOME", "/");
    std::env::set_var("DISPLAY", ":0.0");
    std::env::set_var("TERM", "xterm-256color");
    std::env::set_var("PATH", CONTAINER_PATH);
}

/// Appends a `nameserver` line to a resolv.conf file, creating it if the
/// distro rootfs ships without one.
fn append_nameserver(path: &Path, nameserver: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CaskError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    writeln!(file, "nameserver {nameserver}").map_err(|e| CaskError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Runs the user command through the shell, streaming its output.
fn execute(command: &str) -> Result<i32> {
    use std::os::unix::process::ExitStatusExt;

    tracing::info!(command, "executing container command");
    let status = std::process::Command::new("/bin/sh")
        .arg("-c")
        .arg(command)
        .status()
        .map_err(|e| CaskError::Spawn {
            command: command.to_owned(),
            source: e,
        })?;

    let code = status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0));
    tracing::info!(code, "container command finished");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_nameserver_appends_a_single_line() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let resolv = tmp.path().join("resolv.conf");
        std::fs::write(&resolv, "search localdomain\n").expect("seed");

        append_nameserver(&resolv, "8.8.8.8").expect("append");

        let content = std::fs::read_to_string(&resolv).expect("read");
        assert_eq!(content, "search localdomain\nnameserver 8.8.8.8\n");
    }

    #[test]
    fn append_nameserver_creates_missing_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let resolv = tmp.path().join("resolv.conf");

        append_nameserver(&resolv, "1.1.1.1").expect("append");

        let content = std::fs::read_to_string(&resolv).expect("read");
        assert_eq!(content, "nameserver 1.1.1.1\n");
    }

    #[test]
    fn execute_reports_the_shell_exit_code() {
        let code = execute("exit 7").expect("run");
        assert_eq!(code, 7);
    }

    #[test]
    fn execute_joined_argv_behaves_like_a_shell_line() {
        let code = execute("true && true").expect("run");
        assert_eq!(code, 0);
    }
}
