//! `cask delete` — delete a saved container image.

use clap::Args;

use cask_common::layout::Layout;
use cask_image::catalog;

/// Arguments for the `delete` command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// ID of the image to delete.
    pub id: String,
}

/// Executes the `delete` command.
///
/// # Errors
///
/// Returns an error if no image with the given ID exists or it cannot
/// be removed.
pub fn execute(layout: &Layout, args: &DeleteArgs) -> anyhow::Result<()> {
    catalog::delete(layout, &args.id)?;
    println!("Deleted image {}", args.id);
    Ok(())
}
