//! The container record and its lifecycle state machine.
//!
//! A single run walks `Created → SetupComplete → Running → Exited →
//! CleanedUp`; any failure drops straight into cleanup, which releases
//! every resource class independently so one stuck phase never leaks the
//! others.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::thread::JoinHandle;

use cask_common::constants::DEFAULT_NAMESERVER;
use cask_common::error::{CaskError, Result};
use cask_common::layout::Layout;
use cask_common::types::{ContainerId, Distro, ResourceLimits};
use cask_core::cgroup::CgroupSet;
use cask_core::filesystem;
use cask_core::filesystem::overlayfs::OverlayConfig;
use cask_core::network::{self, bridge, veth};
use cask_image::builder;
use cask_image::store::ImageStore;
use nix::unistd::Pid;

use crate::init::{self, InitConfig};
use crate::process;
use crate::sync::{self, ChildHandoff, HostHandoff};

/// Parameters of a single `run` invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Container identity.
    pub id: ContainerId,
    /// Distribution backing the root filesystem.
    pub distro: Distro,
    /// Host-side data layout.
    pub layout: Layout,
    /// Shell command to execute inside the container.
    pub command: String,
    /// Cgroup limits.
    pub limits: ResourceLimits,
    /// Build an image from the rootfs after the run.
    pub build_image: bool,
}

/// Lifecycle states of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Record constructed, nothing provisioned yet.
    Created,
    /// Filesystem, address, and network worker are in place.
    SetupComplete,
    /// The init process has been cloned.
    Running,
    /// The init process has terminated.
    Exited,
    /// All host resources have been released.
    CleanedUp,
}

/// A container for the duration of one run.
pub struct Container {
    config: RunConfig,
    state: LifecycleState,
    current_user: String,
    lower_dir: Option<PathBuf>,
    ip: Option<Ipv4Addr>,
    child: Option<Pid>,
    exit_code: Option<i32>,
    child_handoff: Option<ChildHandoff>,
    host_fds: [std::os::unix::io::RawFd; 2],
    network_worker: Option<JoinHandle<Result<()>>>,
}

impl Container {
    /// Creates the container record in the `Created` state.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoking user cannot be resolved.
    pub fn new(config: RunConfig) -> Result<Self> {
        Ok(Self {
            config,
            state: LifecycleState::Created,
            current_user: invoking_user()?,
            lower_dir: None,
            ip: None,
            child: None,
            exit_code: None,
            child_handoff: None,
            host_fds: [-1, -1],
            network_worker: None,
        })
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Returns the container's identity.
    #[must_use]
    pub fn id(&self) -> &ContainerId {
        &self.config.id
    }

    /// Returns the container's address, once setup has allocated one.
    #[must_use]
    pub fn ip(&self) -> Option<Ipv4Addr> {
        self.ip
    }

    /// Returns the init process's exit code, once it has terminated.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Drives the full lifecycle: setup, clone, wait, cleanup.
    ///
    /// Cleanup always runs, whatever the earlier phases did.
    ///
    /// # Errors
    ///
    /// Returns the first setup/clone/wait failure, or
    /// [`CaskError::ContainerExit`] when the containerized command
    /// finished with a non-zero status.
    pub fn run(mut self) -> Result<()> {
        let outcome = (|| {
            self.setup()?;
            self.spawn_child()?;
            self.wait_child()
        })();

        self.cleanup();

        match outcome? {
            0 => Ok(()),
            status => Err(CaskError::ContainerExit { status }),
        }
    }

    /// Provisions the filesystem, allocates an address, and launches the
    /// network worker.
    fn setup(&mut self) -> Result<()> {
        let id = &self.config.id;
        tracing::info!(%id, distro = %self.config.distro, "setting up container");

        let store = ImageStore::new(self.config.layout.clone());
        if self.config.build_image {
            store.extract_into(self.config.distro, &self.config.layout.rootfs_dir(id))?;
        } else {
            self.lower_dir = Some(store.materialize(self.config.distro)?);
            for dir in [
                self.config.layout.upper_dir(id),
                self.config.layout.work_dir(id),
                self.config.layout.rootfs_dir(id),
            ] {
                std::fs::create_dir_all(&dir).map_err(|e| CaskError::Io {
                    path: dir.clone(),
                    source: e,
                })?;
            }
        }

        filesystem::chown_recursive(&self.config.layout.container_dir(id), &self.current_user)?;

        bridge::ensure()?;
        let ip = bridge::allocate_ip()?;
        self.ip = Some(ip);

        let (host, child) = sync::handoff()?;
        self.host_fds = host.raw_fds();
        self.child_handoff = Some(child);

        let worker_id = id.clone();
        self.network_worker = Some(
            std::thread::Builder::new()
                .name("network-fabric".into())
                .spawn(move || network_worker(host, &worker_id, ip))
                .map_err(|e| CaskError::Spawn {
                    command: "network-fabric thread".into(),
                    source: e,
                })?,
        );

        self.state = LifecycleState::SetupComplete;
        Ok(())
    }

    /// Clones the init process into its namespaces.
    fn spawn_child(&mut self) -> Result<()> {
        let handoff = self.child_handoff.take().ok_or_else(|| CaskError::Config {
            message: "setup must complete before clone".into(),
        })?;
        let child_fds = handoff.into_raw_fds();

        let id = &self.config.id;
        let overlay = self.lower_dir.as_ref().map(|lower| OverlayConfig {
            lower_dir: lower.clone(),
            upper_dir: self.config.layout.upper_dir(id),
            work_dir: self.config.layout.work_dir(id),
            merged_dir: self.config.layout.rootfs_dir(id),
        });

        let mut init_config = Some(InitConfig {
            id: id.clone(),
            rootfs: self.config.layout.rootfs_dir(id),
            overlay,
            limits: self.config.limits.clone(),
            command: self.config.command.clone(),
            nameserver: DEFAULT_NAMESERVER.into(),
            child_fds,
            host_fds: self.host_fds,
        });

        let spawned = process::spawn_init(move || match init_config.take() {
            Some(config) => init::run(config),
            None => 1,
        });

        // The clone duplicated the descriptor table; without this close a
        // child dying mid-rendezvous would leave the worker's reads open
        // forever instead of failing with a broken channel.
        sync::close_inherited(&child_fds);

        self.child = Some(spawned?);
        self.state = LifecycleState::Running;
        Ok(())
    }

    /// Blocks until the init process terminates.
    fn wait_child(&mut self) -> Result<i32> {
        let pid = self.child.ok_or_else(|| CaskError::Config {
            message: "no child process to wait for".into(),
        })?;

        let code = process::wait_for_exit(pid)?;
        self.exit_code = Some(code);
        self.state = LifecycleState::Exited;
        if code == 0 {
            tracing::info!(id = %self.config.id, "container exited cleanly");
        } else {
            tracing::warn!(id = %self.config.id, code, "container exited abnormally");
        }
        Ok(code)
    }

    /// Releases every resource class, continuing past individual failures.
    fn cleanup(&mut self) {
        let id = self.config.id.clone();
        tracing::info!(%id, "cleaning up container");

        // Unblocks the worker if the child never entered the rendezvous.
        drop(self.child_handoff.take());

        if self.config.build_image {
            let rootfs = self.config.layout.rootfs_dir(&id);
            if rootfs.exists() {
                match builder::build(&self.config.layout, &id, &rootfs) {
                    Ok(archive) => tracing::info!(image = %archive.display(), "image saved"),
                    Err(e) => tracing::warn!(error = %e, "image build failed"),
                }
            }
        }

        let container_dir = self.config.layout.container_dir(&id);
        if container_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&container_dir) {
                tracing::warn!(error = %e, "container directory removal failed");
            }
        }

        if let Err(e) = CgroupSet::new(&id).remove() {
            tracing::warn!(error = %e, "cgroup removal failed");
        }

        if let Some(worker) = self.network_worker.take() {
            match worker.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "network worker failed"),
                Err(_) => tracing::warn!("network worker panicked"),
            }
            if let Err(e) = network::teardown(&id) {
                tracing::warn!(error = %e, "network teardown incomplete");
            }
        }

        self.state = LifecycleState::CleanedUp;
    }
}

/// Drives the parent's side of the network handoff.
fn network_worker(mut host: HostHandoff, id: &ContainerId, ip: Ipv4Addr) -> Result<()> {
    veth::add_netns(id)?;
    host.announce_netns_created()?;
    host.wait_netns_registered()?;
    veth::configure(id, ip)?;
    host.announce_network_configured()?;
    Ok(())
}

/// Resolves the host user owning this run, preferring the sudo caller.
fn invoking_user() -> Result<String> {
    if let Ok(user) = std::env::var("SUDO_USER") {
        if !user.is_empty() {
            return Ok(user);
        }
    }
    let uid = nix::unistd::getuid();
    let user = nix::unistd::User::from_uid(uid)
        .map_err(|e| CaskError::Syscall {
            op: "getpwuid",
            source: e,
        })?
        .ok_or_else(|| CaskError::NotFound {
            kind: "user",
            id: uid.to_string(),
        })?;
    Ok(user.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_config(tmp: &std::path::Path) -> RunConfig {
        RunConfig {
            id: ContainerId::new("testa").expect("valid id"),
            distro: Distro::Alpine,
            layout: Layout::new(tmp),
            command: "/bin/true".into(),
            limits: ResourceLimits::default(),
            build_image: false,
        }
    }

    #[test]
    fn new_container_starts_in_created_state() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let container = Container::new(run_config(tmp.path())).expect("container");
        assert_eq!(container.state(), LifecycleState::Created);
        assert_eq!(container.id().as_str(), "testa");
        assert_eq!(container.ip(), None);
        assert_eq!(container.exit_code(), None);
    }

    #[test]
    fn invoking_user_resolves_to_a_name() {
        let user = invoking_user().expect("user");
        assert!(!user.is_empty());
    }
}
