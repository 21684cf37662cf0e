//! `cask list` — list saved container images.

use clap::Args;

use cask_common::layout::Layout;
use cask_image::catalog;

use crate::output;

/// Arguments for the `list` command.
#[derive(Args, Debug)]
pub struct ListArgs {}

/// Executes the `list` command.
///
/// # Errors
///
/// Returns an error if the images directory cannot be read.
pub fn execute(layout: &Layout) -> anyhow::Result<()> {
    let images = catalog::list(layout)?;
    output::print_image_table(&images);
    Ok(())
}
