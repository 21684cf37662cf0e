//! Linux namespace handling for container isolation.
//!
//! The container's pid/uts/mount/net namespaces are entered through the
//! clone flags in `cask-runtime`; the modules here cover the pieces with
//! their own lifecycle: the UTS hostname and the named network namespace
//! entry under `/var/run/netns`.

pub mod netns;
pub mod uts;
