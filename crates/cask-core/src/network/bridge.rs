//! Host bridge bootstrap and the counting IPv4 allocator.
//!
//! The bridge is created once per host and left in place; containers get
//! consecutive addresses in its /24 subnet, derived from how many veth
//! peers are currently attached. The count-then-assign scheme is racy
//! across concurrent runs, which the one-container-per-invocation model
//! accepts.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use cask_common::constants::{BRIDGE_IP, BRIDGE_NAME, SUBNET_PREFIX_LEN};
use cask_common::error::Result;

use crate::cmd;

/// Prefix of bridge ports that belong to container veth pairs.
const VETH_PORT_PREFIX: &str = "veth1";

/// Returns whether the host bridge already exists.
#[must_use]
pub fn exists() -> bool {
    Path::new("/sys/class/net")
        .join(BRIDGE_NAME)
        .join("bridge")
        .exists()
}

/// Returns the `<network>/<prefix>` form of the bridge subnet.
#[must_use]
pub fn subnet_cidr() -> String {
    let mask = u32::MAX << (32 - u32::from(SUBNET_PREFIX_LEN));
    let network = Ipv4Addr::from(u32::from(BRIDGE_IP) & mask);
    format!("{network}/{SUBNET_PREFIX_LEN}")
}

/// Returns the commands that create the bridge and its NAT rules.
#[must_use]
pub fn bootstrap_plan() -> Vec<Vec<String>> {
    let argv = |parts: &[&str]| -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    };
    vec![
        argv(&["brctl", "addbr", BRIDGE_NAME]),
        argv(&["ip", "link", "set", BRIDGE_NAME, "up"]),
        argv(&[
            "ip",
            "addr",
            "add",
            &format!("{BRIDGE_IP}/{SUBNET_PREFIX_LEN}"),
            "dev",
            BRIDGE_NAME,
        ]),
        argv(&["iptables", "-P", "FORWARD", "ACCEPT"]),
        argv(&[
            "iptables",
            "-t",
            "nat",
            "-A",
            "POSTROUTING",
            "-s",
            &subnet_cidr(),
            "!",
            "-o",
            BRIDGE_NAME,
            "-j",
            "MASQUERADE",
        ]),
    ]
}

/// Creates the bridge and its NAT rules unless it already exists.
///
/// # Errors
///
/// Returns an error if any bootstrap command fails.
pub fn ensure() -> Result<()> {
    if exists() {
        tracing::debug!(bridge = BRIDGE_NAME, "bridge already present");
        return Ok(());
    }
    tracing::info!(bridge = BRIDGE_NAME, "creating bridge and NAT rules");
    for argv in bootstrap_plan() {
        cmd::run(&argv)?;
    }
    Ok(())
}

/// Counts the container veth peers attached under a bridge port directory.
///
/// A missing directory counts as zero: the bridge has no ports yet.
#[must_use]
pub fn count_veth_ports(brif_dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(brif_dir) else {
        return 0;
    };
    entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(VETH_PORT_PREFIX)
        })
        .count()
}

/// Computes the address for the (count+1)-th container on the bridge.
#[must_use]
pub fn container_ip(attached: usize) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(BRIDGE_IP) + attached as u32 + 1)
}

/// Allocates an address for a new container from the live bridge state.
///
/// # Errors
///
/// Infallible today; kept fallible so a stricter allocator can slot in.
pub fn allocate_ip() -> Result<Ipv4Addr> {
    let brif = PathBuf::from("/sys/class/net")
        .join(BRIDGE_NAME)
        .join("brif");
    let attached = count_veth_ports(&brif);
    let ip = container_ip(attached);
    tracing::info!(%ip, attached, "container address allocated");
    Ok(ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subnet_cidr_masks_host_bits() {
        assert_eq!(subnet_cidr(), "107.17.0.0/24");
    }

    #[test]
    fn first_container_gets_bridge_ip_plus_one() {
        assert_eq!(container_ip(0), Ipv4Addr::new(107, 17, 0, 2));
    }

    #[test]
    fn consecutive_containers_get_consecutive_ips() {
        assert_eq!(container_ip(1), Ipv4Addr::new(107, 17, 0, 3));
        assert_eq!(container_ip(4), Ipv4Addr::new(107, 17, 0, 6));
    }

    #[test]
    fn missing_brif_dir_counts_as_empty_bridge() {
        assert_eq!(count_veth_ports(Path::new("/nonexistent/brif")), 0);
    }

    #[test]
    fn count_ignores_non_veth_ports() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for port in ["veth1abc123456", "veth1def", "eth0", "veth0zzz"] {
            std::fs::write(tmp.path().join(port), "").expect("touch");
        }
        assert_eq!(count_veth_ports(tmp.path()), 2);
    }

    #[test]
    fn bootstrap_plan_creates_bridge_before_addressing_it() {
        let plan = bootstrap_plan();
        assert_eq!(plan[0][..2], ["brctl", "addbr"]);
        assert!(plan.iter().any(|argv| argv.contains(&"MASQUERADE".into())));
    }
}
