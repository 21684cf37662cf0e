//! Root filesystem switching via `pivot_root(2)`.
//!
//! Used in overlay mode; build-image mode falls back to a plain `chroot`
//! so the final tree stays a concrete directory that can be archived.

use std::path::Path;

use cask_common::error::Result;

/// Name of the transient directory that briefly holds the old root.
const PUT_OLD: &str = "temp";

/// Switches the process root to `new_root` using `pivot_root(2)`.
///
/// Performs the full pivot sequence:
/// 1. Bind-mount `new_root` onto itself so it is a mount point.
/// 2. Create `<new_root>/temp` to receive the old root.
/// 3. Call `pivot_root(2)`.
/// 4. Change working directory to `/`.
/// 5. Lazily detach and remove `/temp`.
///
/// # Errors
///
/// Returns an error if any mount, pivot, or cleanup step fails.
#[cfg(target_os = "linux")]
pub fn pivot_root(new_root: &Path) -> Result<()> {
    use cask_common::error::CaskError;
    use nix::mount::{mount, umount2, MntFlags, MsFlags};

    mount(
        Some(new_root),
        new_root,
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| CaskError::Syscall {
        op: "mount(bind self)",
        source: e,
    })?;

    let put_old = new_root.join(PUT_OLD);
    std::fs::create_dir_all(&put_old).map_err(|e| CaskError::Io {
        path: put_old.clone(),
        source: e,
    })?;

    nix::unistd::pivot_root(new_root, &put_old).map_err(|e| CaskError::Syscall {
        op: "pivot_root",
        source: e,
    })?;

    std::env::set_current_dir("/").map_err(|e| CaskError::Io {
        path: "/".into(),
        source: e,
    })?;

    let old_root = Path::new("/").join(PUT_OLD);
    umount2(&old_root, MntFlags::MNT_DETACH).map_err(|e| CaskError::Syscall {
        op: "umount2(old root)",
        source: e,
    })?;
    let _ = std::fs::remove_dir(&old_root);

    tracing::info!(root = %new_root.display(), "pivot_root complete");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — `pivot_root` requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn pivot_root(_new_root: &Path) -> Result<()> {
    Err(cask_common::error::CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}

/// Switches the process root with a plain `chroot(2)` and enters it.
///
/// # Errors
///
/// Returns an error if the chroot or the directory change fails.
#[cfg(target_os = "linux")]
pub fn enter_chroot(new_root: &Path) -> Result<()> {
    use cask_common::error::CaskError;

    nix::unistd::chroot(new_root).map_err(|e| CaskError::Syscall {
        op: "chroot",
        source: e,
    })?;
    std::env::set_current_dir("/").map_err(|e| CaskError::Io {
        path: "/".into(),
        source: e,
    })?;
    tracing::info!(root = %new_root.display(), "chroot complete");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — `chroot` into a container rootfs requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn enter_chroot(_new_root: &Path) -> Result<()> {
    Err(cask_common::error::CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}
