//! Veth pair plumbing between the container netns and the host bridge.

use std::net::Ipv4Addr;

use cask_common::constants::{BRIDGE_IP, BRIDGE_NAME, SUBNET_PREFIX_LEN};
use cask_common::error::Result;
use cask_common::types::ContainerId;

use crate::cmd;

/// Returns the name of the veth end that moves into the container.
#[must_use]
pub fn inside_name(id: &ContainerId) -> String {
    format!("veth0{}", id.veth_suffix())
}

/// Returns the name of the veth end that attaches to the bridge.
#[must_use]
pub fn outside_name(id: &ContainerId) -> String {
    format!("veth1{}", id.veth_suffix())
}

/// Creates the named network namespace entry for the container.
///
/// Must run before the child bind-mounts its own namespace over the entry.
///
/// # Errors
///
/// Returns an error if `ip netns add` fails.
pub fn add_netns(id: &ContainerId) -> Result<()> {
    cmd::run(&["ip", "netns", "add", id.as_str()])
}

/// Returns the commands that build and address the veth pair.
///
/// Ordering follows the handoff contract: the pair is created on the host,
/// one end moves into the already-registered namespace, the other under
/// the bridge, then both sides come up and the default route is installed.
#[must_use]
pub fn setup_plan(id: &ContainerId, ip: Ipv4Addr) -> Vec<Vec<String>> {
    let inside = inside_name(id);
    let outside = outside_name(id);
    let netns = id.as_str();
    let argv = |parts: &[&str]| -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    };

    vec![
        argv(&[
            "ip", "link", "add", &inside, "type", "veth", "peer", "name", &outside,
        ]),
        argv(&["ip", "link", "set", &inside, "netns", netns]),
        argv(&["ip", "link", "set", &outside, "master", BRIDGE_NAME]),
        argv(&[
            "ip",
            "netns",
            "exec",
            netns,
            "ip",
            "addr",
            "add",
            &format!("{ip}/{SUBNET_PREFIX_LEN}"),
            "dev",
            &inside,
        ]),
        argv(&["ip", "netns", "exec", netns, "ip", "link", "set", &inside, "up"]),
        argv(&["ip", "netns", "exec", netns, "ip", "link", "set", "lo", "up"]),
        argv(&["ip", "link", "set", &outside, "up"]),
        argv(&[
            "ip",
            "netns",
            "exec",
            netns,
            "ip",
            "route",
            "add",
            "default",
            "via",
            &BRIDGE_IP.to_string(),
        ]),
    ]
}

/// Builds the veth pair and wires it between the namespace and the bridge.
///
/// # Errors
///
/// Returns an error on the first failing `ip` invocation.
pub fn configure(id: &ContainerId, ip: Ipv4Addr) -> Result<()> {
    for argv in setup_plan(id, ip) {
        cmd::run(&argv)?;
    }
    tracing::info!(id = %id, %ip, "veth pair configured");
    Ok(())
}

/// Deletes the bridge-side veth end; the peer inside the namespace
/// disappears with it.
///
/// # Errors
///
/// Returns an error if `ip link del` fails.
pub fn delete(id: &ContainerId) -> Result<()> {
    let outside = outside_name(id);
    cmd::run_quiet(&["ip", "link", "del", outside.as_str()])
}

/// Removes the named network namespace entry.
///
/// # Errors
///
/// Returns an error if `ip netns del` fails.
pub fn delete_netns(id: &ContainerId) -> Result<()> {
    cmd::run_quiet(&["ip", "netns", "del", id.as_str()])
}
