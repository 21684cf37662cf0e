//! Domain primitive types used across the cask workspace.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CaskError, Result};

/// Number of characters in a generated container ID.
pub const GENERATED_ID_LEN: usize = 12;

const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Unique identifier for a container instance.
///
/// The ID is the single naming key for every per-container host resource:
/// the network namespace entry, the veth suffix (first nine characters),
/// the hostname, the cgroup subdirectories, and the on-disk directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a user-supplied string.
    ///
    /// # Errors
    ///
    /// Returns an error unless the value is 1–12 lowercase alphanumeric
    /// characters; anything longer would overflow the 15-char kernel limit
    /// on interface names once the `veth0`/`veth1` prefix is added.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty()
            || id.len() > GENERATED_ID_LEN
            || !id
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(CaskError::Config {
                message: format!(
                    "container id `{id}` must be 1-{GENERATED_ID_LEN} lowercase alphanumeric characters"
                ),
            });
        }
        Ok(Self(id))
    }

    /// Generates a random 12-character container ID.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..GENERATED_ID_LEN)
            .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
            .collect();
        Self(id)
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the prefix used to name both ends of the veth pair.
    #[must_use]
    pub fn veth_suffix(&self) -> &str {
        &self.0[..self.0.len().min(9)]
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The Linux distributions whose root filesystems can back a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distro {
    /// Ubuntu base 20.04.
    Ubuntu,
    /// Alpine minirootfs 3.14.
    Alpine,
    /// CentOS 7 docker rootfs.
    Centos,
    /// Arch Linux rootfs.
    Arch,
}

impl Distro {
    /// All supported distributions.
    pub const ALL: [Self; 4] = [Self::Ubuntu, Self::Alpine, Self::Centos, Self::Arch];

    /// Returns the lowercase name used on the CLI and in cache paths.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ubuntu => "ubuntu",
            Self::Alpine => "alpine",
            Self::Centos => "centos",
            Self::Arch => "arch",
        }
    }

    /// Returns the download URL of the rootfs archive.
    #[must_use]
    pub fn url(self) -> &'static str {
        match self {
            Self::Ubuntu => "http://cdimage.ubuntu.com/ubuntu-base/releases/20.04.2/release/ubuntu-base-20.04.1-base-amd64.tar.gz",
            Self::Alpine => "https://dl-cdn.alpinelinux.org/alpine/v3.14/releases/x86_64/alpine-minirootfs-3.14.0-x86_64.tar.gz",
            Self::Centos => "https://github.com/Xiekers/rootfs/raw/master/centos-7-docker.tar.xz",
            Self::Arch => "https://github.com/Xiekers/rootfs/raw/master/archlinux.tar.xz",
        }
    }

    /// Returns the basename of the rootfs archive within the cache.
    #[must_use]
    pub fn archive_name(self) -> &'static str {
        match self {
            Self::Ubuntu => "ubuntu-base-20.04.1-base-amd64.tar.gz",
            Self::Alpine => "alpine-minirootfs-3.14.0-x86_64.tar.gz",
            Self::Centos => "centos-7-docker.tar.xz",
            Self::Arch => "archlinux.tar.xz",
        }
    }
}

impl FromStr for Distro {
    type Err = CaskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ubuntu" => Ok(Self::Ubuntu),
            "alpine" => Ok(Self::Alpine),
            "centos" => Ok(Self::Centos),
            "arch" => Ok(Self::Arch),
            other => Err(CaskError::Config {
                message: format!(
                    "root file system `{other}` is not an option (ubuntu, alpine, centos, arch)"
                ),
            }),
        }
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resource limits applied to a container's cgroups.
///
/// The kernel control files accept suffixed values (`256m`) and the literal
/// `max`, so the memory and pid limits stay strings and pass through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Value for `pids.max`; `"max"` removes the limit.
    pub process_number: String,
    /// Value for `cpu.shares`, a relative weight.
    pub cpu_shares: u64,
    /// Value for `memory.limit_in_bytes`.
    pub memory: String,
    /// Value for `memory.memsw.limit_in_bytes`.
    pub memory_swap: String,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            process_number: "20".into(),
            cpu_shares: 512,
            memory: "256m".into(),
            memory_swap: "512m".into(),
        }
    }
}
