//! Memory and swap control via the `memory` controller.

use std::path::Path;

use cask_common::error::Result;
use nix::unistd::Pid;

use super::write_control;

const TASKS: &str = "tasks";
const MEMORY_LIMIT: &str = "memory.limit_in_bytes";
const MEMSW_LIMIT: &str = "memory.memsw.limit_in_bytes";

/// Attaches the process and writes the memory and memory+swap limits.
///
/// Values like `256m` or `-1` are accepted by the kernel directly and are
/// not parsed here.
///
/// # Errors
///
/// Returns an error if any control-file write fails.
pub fn apply(dir: &Path, memory: &str, memory_swap: &str, pid: Pid) -> Result<()> {
    write_control(dir, TASKS, &pid.to_string())?;
    write_control(dir, MEMORY_LIMIT, memory)?;
    write_control(dir, MEMSW_LIMIT, memory_swap)?;
    tracing::debug!(memory, memory_swap, "memory limits set");
    Ok(())
}
