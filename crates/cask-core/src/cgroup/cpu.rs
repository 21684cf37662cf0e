//! CPU weight control via the `cpu` controller.

use std::path::Path;

use cask_common::error::Result;
use nix::unistd::Pid;

use super::write_control;

const TASKS: &str = "tasks";
const CPU_SHARES: &str = "cpu.shares";

/// Attaches the process and writes its relative CPU share.
///
/// # Errors
///
/// Returns an error if any control-file write fails.
pub fn apply(dir: &Path, shares: u64, pid: Pid) -> Result<()> {
    write_control(dir, TASKS, &pid.to_string())?;
    write_control(dir, CPU_SHARES, &shares.to_string())?;
    tracing::debug!(shares, "cpu shares set");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_writes_shares_and_task() {
        let tmp = tempfile::tempdir().expect("tempdir");
        apply(tmp.path(), 512, Pid::from_raw(9)).expect("apply");

        assert_eq!(
            std::fs::read_to_string(tmp.path().join(CPU_SHARES)).expect("read"),
            "512\n"
        );
        assert_eq!(
            std::fs::read_to_string(tmp.path().join(TASKS)).expect("read"),
            "9\n"
        );
    }
}
