//! Subprocess invocation helpers.
//!
//! The engine shells out for network plumbing (`ip`, `iptables`, `brctl`)
//! and archive handling (`wget`, `tar`); every invocation funnels through
//! here so failures carry the full command line.

use std::process::{Command, Stdio};

use cask_common::error::{CaskError, Result};

/// Runs a command to completion, inheriting stdout/stderr.
///
/// # Errors
///
/// Returns [`CaskError::Spawn`] if the program cannot be launched and
/// [`CaskError::Command`] if it exits with a non-zero status.
pub fn run<S: AsRef<str>>(argv: &[S]) -> Result<()> {
    run_with_stdio(argv, false)
}

/// Runs a command to completion with stdout/stderr discarded.
///
/// # Errors
///
/// Same failure modes as [`run`].
pub fn run_quiet<S: AsRef<str>>(argv: &[S]) -> Result<()> {
    run_with_stdio(argv, true)
}

fn run_with_stdio<S: AsRef<str>>(argv: &[S], quiet: bool) -> Result<()> {
    let command_line = display(argv);
    let (program, args) = argv.split_first().ok_or_else(|| CaskError::Config {
        message: "empty command".into(),
    })?;

    tracing::debug!(command = %command_line, "running command");
    let mut command = Command::new(program.as_ref());
    command.args(args.iter().map(|arg| arg.as_ref()));
    if quiet {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }

    let status = command.status().map_err(|e| CaskError::Spawn {
        command: command_line.clone(),
        source: e,
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(CaskError::Command {
            command: command_line,
            status: status.code().unwrap_or(-1),
        })
    }
}

/// Renders an argv as a single loggable command line.
#[must_use]
pub fn display<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|part| part.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_argv_with_spaces() {
        assert_eq!(display(&["ip", "netns", "add", "testa"]), "ip netns add testa");
    }

    #[test]
    fn successful_command_returns_ok() {
        run_quiet(&["true"]).expect("true exits 0");
    }

    #[test]
    fn failing_command_reports_status() {
        let err = run_quiet(&["false"]).unwrap_err();
        match err {
            CaskError::Command { command, status } => {
                assert_eq!(command, "false");
                assert_eq!(status, 1);
            }
            other => panic!("expected Command error, got {other}"),
        }
    }

    #[test]
    fn missing_program_reports_spawn_failure() {
        let err = run_quiet(&["cask-test-no-such-program"]).unwrap_err();
        assert!(matches!(err, CaskError::Spawn { .. }));
    }

    #[test]
    fn empty_argv_is_rejected() {
        let argv: [&str; 0] = [];
        assert!(run(&argv).is_err());
    }
}
