//! # cask-common
//!
//! Shared types, error definitions, path layout, and constants used
//! across the entire cask workspace.
//!
//! This crate is the leaf of the dependency graph — it depends on no other
//! internal crate and provides the foundational primitives that all other
//! crates build upon.

pub mod constants;
pub mod error;
pub mod layout;
pub mod types;
