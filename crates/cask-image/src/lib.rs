//! # cask-image
//!
//! Root filesystem and image handling for the cask runtime.
//!
//! Handles:
//! - **Store**: downloads each distro's rootfs archive once, extracts it
//!   into a cached lower dir shared by every run.
//! - **Builder**: archives a finished container rootfs into the images
//!   directory when a run is started with `--build`.
//! - **Catalog**: lists and deletes the built image archives.

pub mod builder;
pub mod catalog;
pub mod store;
