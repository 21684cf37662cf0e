//! Filesystem management for container isolation.
//!
//! Provides overlay mounts, `pivot_root` for root filesystem switching,
//! the pseudo-filesystem mounts a container expects under its new root,
//! and the device nodes populating its `/dev`.

pub mod devices;
pub mod mount;
pub mod overlayfs;
pub mod pivot_root;

use std::path::Path;

use cask_common::error::Result;

use crate::cmd;

/// Makes the given user the owner of a directory tree.
///
/// Shells out to `chown -R`: in build-image mode the tree is a freshly
/// extracted distro rootfs with thousands of entries.
///
/// # Errors
///
/// Returns an error if `chown` cannot be launched or exits non-zero.
pub fn chown_recursive(path: &Path, user: &str) -> Result<()> {
    let path_arg = path.display().to_string();
    cmd::run(&["chown", "-R", user, path_arg.as_str()])?;
    tracing::info!(path = %path.display(), user, "ownership transferred");
    Ok(())
}
