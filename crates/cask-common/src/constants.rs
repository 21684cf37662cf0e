//! System-wide constants and default values.

use std::net::Ipv4Addr;

/// Application name used in CLI output and logs.
pub const APP_NAME: &str = "cask";

/// Default host-side base directory for all cask data.
pub const DEFAULT_ROOT_DIR: &str = "../res";

/// Name of the host bridge that all container veth peers attach to.
pub const BRIDGE_NAME: &str = "cask0";

/// Host-visible IPv4 address of the bridge.
pub const BRIDGE_IP: Ipv4Addr = Ipv4Addr::new(107, 17, 0, 1);

/// Prefix length of the bridge subnet.
pub const SUBNET_PREFIX_LEN: u8 = 24;

/// Nameserver written into the container's `/etc/resolv.conf`.
pub const DEFAULT_NAMESERVER: &str = "8.8.8.8";

/// Legacy cgroup v1 hierarchy mount point.
pub const CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Directory where `ip netns` keeps named network namespace bind files.
pub const NETNS_RUN_DIR: &str = "/var/run/netns";

/// Stack size handed to `clone(2)` for the container init process.
pub const CHILD_STACK_SIZE: usize = 64 * 1024;

/// `PATH` exported inside the container.
pub const CONTAINER_PATH: &str = "/bin:/sbin:/usr/bin:/usr/sbin:/src:/usr/local/bin:/usr/local/sbin";

/// Upper (writable) overlay layer directory name inside a container dir.
pub const UPPER_DIR: &str = "copy-on-write";

/// Overlay scratch directory name inside a container dir.
pub const WORK_DIR: &str = "work";

/// Merged overlay mountpoint name inside a container dir.
pub const ROOTFS_DIR: &str = "rootfs";
