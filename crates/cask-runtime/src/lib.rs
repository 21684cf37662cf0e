//! # cask-runtime
//!
//! Container lifecycle orchestration: the parent/child handoff channels,
//! the cloned init sequence, and the state machine that drives
//! setup → clone → wait → cleanup for a single run.

#![allow(unsafe_code)]

pub mod container;
pub mod init;
pub mod process;
pub mod sync;
