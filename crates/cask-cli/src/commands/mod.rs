//! CLI command definitions and dispatch.

pub mod delete;
pub mod list;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cask_common::constants::DEFAULT_ROOT_DIR;
use cask_common::layout::Layout;
use cask_common::types::{ContainerId, Distro};

/// cask — run a command inside an isolated container.
#[derive(Parser, Debug)]
#[command(name = "cask", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// The root file system for the container.
    #[arg(short = 't', long = "rootfs", global = true, default_value = "ubuntu")]
    pub rootfs: Distro,

    /// The ID that will be given to the container.
    #[arg(short = 'i', long = "container-id", global = true)]
    pub container_id: Option<String>,

    /// The directory where all cask related files will be stored.
    #[arg(short = 'r', long = "root-dir", global = true, default_value = DEFAULT_ROOT_DIR)]
    pub root_dir: PathBuf,

    /// Build an image from the container's rootfs when it exits.
    #[arg(short = 'b', long = "build", global = true)]
    pub build: bool,

    /// The maximum number of processes in the container; "max" removes
    /// the limit.
    #[arg(short = 'p', long = "process-number", global = true, default_value = "20")]
    pub process_number: String,

    /// The relative share of CPU time available for the container.
    #[arg(short = 'c', long = "cpu-share", global = true, default_value_t = 512)]
    pub cpu_share: u64,

    /// The user memory limit of the container; -1 removes the limit.
    #[arg(short = 'm', long = "memory", global = true, default_value = "256m")]
    pub memory: String,

    /// The limit on the sum of memory and swap usage; -1 removes the
    /// limit.
    #[arg(short = 's', long = "memory-swap", global = true, default_value = "512m")]
    pub memory_swap: String,

    /// Write logs to `<root-dir>/logs/<container-id>.log`.
    #[arg(short = 'l', long = "logging", global = true)]
    pub logging: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command in a new container.
    Run(run::RunArgs),
    /// List saved container images.
    #[command(alias = "ls")]
    List(list::ListArgs),
    /// Delete a saved container image.
    #[command(alias = "rm", alias = "remove")]
    Delete(delete::DeleteArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails; `main` maps any
/// error to exit code 1.
pub fn execute(cli: Cli, container_id: ContainerId, layout: Layout) -> anyhow::Result<()> {
    match &cli.command {
        Command::Run(args) => run::execute(&cli, args, container_id, layout),
        Command::List(_) => list::execute(&layout),
        Command::Delete(args) => delete::execute(&layout, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_match_documented_values() {
        let cli = Cli::try_parse_from(["cask", "run"]).expect("parse");
        assert_eq!(cli.rootfs, Distro::Ubuntu);
        assert_eq!(cli.root_dir, PathBuf::from("../res"));
        assert_eq!(cli.process_number, "20");
        assert_eq!(cli.cpu_share, 512);
        assert_eq!(cli.memory, "256m");
        assert_eq!(cli.memory_swap, "512m");
        assert!(!cli.build);
        assert!(!cli.logging);
        assert!(cli.container_id.is_none());

        let Command::Run(args) = &cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.command, ["/bin/sh"]);
    }

    #[test]
    fn flags_before_the_verb_are_accepted() {
        let cli = Cli::try_parse_from([
            "cask", "-t", "alpine", "-i", "testa", "-m", "64m", "run", "/bin/true",
        ])
        .expect("parse");
        assert_eq!(cli.rootfs, Distro::Alpine);
        assert_eq!(cli.container_id.as_deref(), Some("testa"));
        assert_eq!(cli.memory, "64m");

        let Command::Run(args) = &cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.command, ["/bin/true"]);
    }

    #[test]
    fn run_command_tail_keeps_hyphenated_arguments() {
        let cli = Cli::try_parse_from(["cask", "run", "/bin/sh", "-c", "echo hi"]).expect("parse");
        let Command::Run(args) = &cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.command, ["/bin/sh", "-c", "echo hi"]);
    }

    #[test]
    fn list_accepts_ls_alias() {
        let cli = Cli::try_parse_from(["cask", "ls"]).expect("parse");
        assert!(matches!(cli.command, Command::List(_)));
    }

    #[test]
    fn delete_accepts_rm_and_remove_aliases() {
        for alias in ["delete", "rm", "remove"] {
            let cli = Cli::try_parse_from(["cask", alias, "testb"]).expect("parse");
            let Command::Delete(args) = &cli.command else {
                panic!("expected delete command");
            };
            assert_eq!(args.id, "testb");
        }
    }

    #[test]
    fn unknown_rootfs_is_rejected() {
        assert!(Cli::try_parse_from(["cask", "-t", "gentoo", "run"]).is_err());
    }
}
