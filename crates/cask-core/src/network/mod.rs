//! Per-container network fabric.
//!
//! Each container gets a veth pair: `veth0<suffix>` moves into the
//! container's named network namespace, `veth1<suffix>` attaches to the
//! host bridge. The suffix is the first nine characters of the container
//! ID, keeping both names inside the kernel's 15-character limit.

pub mod bridge;
pub mod veth;

use cask_common::error::Result;
use cask_common::types::ContainerId;

use crate::namespace::netns;

/// Tears down every network resource keyed by the container ID.
///
/// All three steps are attempted regardless of individual failures so a
/// partially built fabric still gets dismantled; the first error is
/// returned afterwards.
///
/// # Errors
///
/// Returns the first failure among the netns unmount, the veth deletion,
/// and the netns removal.
pub fn teardown(id: &ContainerId) -> Result<()> {
    let mut first_error = None;

    for outcome in [
        netns::unregister(id),
        veth::delete(id),
        veth::delete_netns(id),
    ] {
        if let Err(e) = outcome {
            tracing::warn!(id = %id, error = %e, "network teardown step failed");
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        None => Ok(()),
        Some(e) => Err(e),
    }
}
