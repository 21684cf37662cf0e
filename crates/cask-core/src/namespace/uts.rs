//! UTS namespace handling.
//!
//! The container's hostname is its ID; the call happens inside the fresh
//! UTS namespace so the host name is untouched.

use cask_common::error::Result;

/// Sets the hostname inside the current UTS namespace.
///
/// # Errors
///
/// Returns an error if `sethostname(2)` fails.
#[cfg(target_os = "linux")]
pub fn set_hostname(hostname: &str) -> Result<()> {
    use cask_common::error::CaskError;

    nix::unistd::sethostname(hostname).map_err(|e| CaskError::Syscall {
        op: "sethostname",
        source: e,
    })?;
    tracing::debug!(hostname, "hostname set");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — UTS namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn set_hostname(_hostname: &str) -> Result<()> {
    Err(cask_common::error::CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}
