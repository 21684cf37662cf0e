//! Device nodes and descriptor symlinks for the container's `/dev`.

use cask_common::error::Result;

/// Character devices a minimal `/dev` needs: name, major, minor.
const DEVICES: [(&str, u64, u64); 7] = [
    ("null", 1, 3),
    ("zero", 1, 5),
    ("random", 1, 8),
    ("urandom", 1, 9),
    ("console", 136, 1),
    ("tty", 5, 0),
    ("full", 1, 7),
];

/// Symlinks exposing the process's own descriptors: target, link.
const FD_SYMLINKS: [(&str, &str); 4] = [
    ("/proc/self/fd", "/dev/fd"),
    ("/proc/self/fd/0", "/dev/stdin"),
    ("/proc/self/fd/1", "/dev/stdout"),
    ("/proc/self/fd/2", "/dev/stderr"),
];

/// Creates the standard character device nodes under `/dev`, mode 0666.
///
/// # Errors
///
/// Returns an error if any `mknod(2)` call fails.
#[cfg(target_os = "linux")]
pub fn create_device_nodes() -> Result<()> {
    use cask_common::error::CaskError;
    use nix::sys::stat::{makedev, mknod, Mode, SFlag};

    let mode = Mode::from_bits_truncate(0o666);
    for (name, major, minor) in DEVICES {
        let path = format!("/dev/{name}");
        mknod(path.as_str(), SFlag::S_IFCHR, mode, makedev(major, minor)).map_err(|e| {
            CaskError::Syscall {
                op: "mknod",
                source: e,
            }
        })?;
    }
    tracing::debug!("device nodes created");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — device nodes require Linux.
#[cfg(not(target_os = "linux"))]
pub fn create_device_nodes() -> Result<()> {
    Err(cask_common::error::CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}

/// Symlinks `/proc/self/fd` and the three standard streams into `/dev`.
///
/// # Errors
///
/// Returns an error if a symlink cannot be created.
#[cfg(target_os = "linux")]
pub fn create_fd_symlinks() -> Result<()> {
    use cask_common::error::CaskError;

    for (target, link) in FD_SYMLINKS {
        std::os::unix::fs::symlink(target, link).map_err(|e| CaskError::Io {
            path: link.into(),
            source: e,
        })?;
    }
    tracing::debug!("fd symlinks created");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — `/dev` population requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn create_fd_symlinks() -> Result<()> {
    Err(cask_common::error::CaskError::Config {
        message: "Linux is required to run containers".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_table_covers_the_standard_nodes() {
        let names: Vec<&str> = DEVICES.iter().map(|(name, _, _)| *name).collect();
        for expected in ["null", "zero", "random", "urandom", "console", "tty", "full"] {
            assert!(names.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn every_stream_gets_a_symlink() {
        let links: Vec<&str> = FD_SYMLINKS.iter().map(|(_, link)| *link).collect();
        for expected in ["/dev/fd", "/dev/stdin", "/dev/stdout", "/dev/stderr"] {
            assert!(links.contains(&expected), "missing {expected}");
        }
    }
}
