//! `cask run` — run a command in a new container.

use clap::Args;

use cask_common::layout::Layout;
use cask_common::types::{ContainerId, ResourceLimits};
use cask_runtime::container::{Container, RunConfig};

use super::Cli;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// The command to be executed in the container.
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        default_value = "/bin/sh"
    )]
    pub command: Vec<String>,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if setup, the cloned init, or the containerized
/// command fails.
pub fn execute(
    cli: &Cli,
    args: &RunArgs,
    container_id: ContainerId,
    layout: Layout,
) -> anyhow::Result<()> {
    let config = RunConfig {
        id: container_id.clone(),
        distro: cli.rootfs,
        layout,
        command: args.command.join(" "),
        limits: ResourceLimits {
            process_number: cli.process_number.clone(),
            cpu_shares: cli.cpu_share,
            memory: cli.memory.clone(),
            memory_swap: cli.memory_swap.clone(),
        },
        build_image: cli.build,
    };

    tracing::info!(id = %container_id, distro = %cli.rootfs, "starting run");
    Container::new(config)?.run()?;
    println!("{container_id}");
    Ok(())
}
