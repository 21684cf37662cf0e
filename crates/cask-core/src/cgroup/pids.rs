//! Process-number control via the `pids` controller.

use std::path::Path;

use cask_common::error::Result;
use nix::unistd::Pid;

use super::write_control;

const PIDS_MAX: &str = "pids.max";
const NOTIFY_ON_RELEASE: &str = "notify_on_release";
const CGROUP_PROCS: &str = "cgroup.procs";

/// Writes the pid limit and attaches the process.
///
/// The limit string passes through verbatim, so `"max"` removes the cap
/// without any numeric parsing.
///
/// # Errors
///
/// Returns an error if any control-file write fails.
pub fn apply(dir: &Path, process_number: &str, pid: Pid) -> Result<()> {
    write_control(dir, PIDS_MAX, process_number)?;
    write_control(dir, NOTIFY_ON_RELEASE, "1")?;
    write_control(dir, CGROUP_PROCS, &pid.to_string())?;
    tracing::debug!(limit = process_number, "pids limit set");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_writes_numeric_limit() {
        let tmp = tempfile::tempdir().expect("tempdir");
        apply(tmp.path(), "20", Pid::from_raw(100)).expect("apply");

        let max = std::fs::read_to_string(tmp.path().join(PIDS_MAX)).expect("read");
        assert_eq!(max, "20\n");
        let notify = std::fs::read_to_string(tmp.path().join(NOTIFY_ON_RELEASE)).expect("read");
        assert_eq!(notify, "1\n");
    }

    #[test]
    fn apply_passes_max_through_verbatim() {
        let tmp = tempfile::tempdir().expect("tempdir");
        apply(tmp.path(), "max", Pid::from_raw(100)).expect("apply");

        let max = std::fs::read_to_string(tmp.path().join(PIDS_MAX)).expect("read");
        assert_eq!(max, "max\n");
    }
}
