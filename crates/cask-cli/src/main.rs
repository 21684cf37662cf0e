//! # cask — minimalist Linux container runtime
//!
//! Runs a command inside an isolated process, filesystem, network, and
//! resource envelope, and tears the envelope down on exit.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod commands;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cask_common::layout::Layout;
use cask_common::types::ContainerId;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let container_id = match cli.container_id.as_deref() {
        Some(value) => ContainerId::new(value)?,
        None => ContainerId::generate(),
    };
    let layout = Layout::new(&cli.root_dir);

    init_tracing(&cli, &layout, &container_id)?;
    commands::execute(cli, container_id, layout)
}

/// Installs the log subscriber: stderr by default, a per-run file under
/// `<root>/logs/` when `--logging` is given.
fn init_tracing(cli: &Cli, layout: &Layout, id: &ContainerId) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if cli.logging {
        std::fs::create_dir_all(layout.logs_dir())?;
        let file = std::fs::File::create(layout.log_file(id))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
