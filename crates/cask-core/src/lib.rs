//! # cask-core
//!
//! Low-level Linux isolation primitives for the cask runtime.
//!
//! This crate provides safe abstractions over:
//! - **Cgroups v1**: pids, memory, and cpu resource limiting.
//! - **Filesystem**: overlay mounts, `pivot_root`, pseudo-filesystems,
//!   and device nodes for the container's `/dev`.
//! - **Namespaces**: UTS hostname handling and network namespace
//!   registration under `/var/run/netns`.
//! - **Network**: the host bridge, veth pair plumbing, and the counting
//!   IPv4 allocator.
//!
//! Everything here is a leaf operation; sequencing across processes is the
//! job of `cask-runtime`.

pub mod cgroup;
pub mod cmd;
pub mod filesystem;
pub mod namespace;
pub mod network;
