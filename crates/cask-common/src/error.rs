//! Unified error types for the cask workspace.
//!
//! Every phase of a container run maps its failures onto these variants so
//! the orchestrator can log them uniformly and keep cleanup going.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CaskError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A syscall failed.
    #[error("{op} failed: {source}")]
    Syscall {
        /// Name of the failing operation, e.g. `mount(overlay)`.
        op: &'static str,
        /// Errno returned by the kernel.
        source: nix::Error,
    },

    /// An external command could not be launched.
    #[error("could not launch `{command}`: {source}")]
    Spawn {
        /// The full command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An external command exited with a non-zero status.
    #[error("`{command}` exited with status {status}")]
    Command {
        /// The full command line.
        command: String,
        /// Exit status, or -1 when killed by a signal.
        status: i32,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// The handoff channel peer went away before the rendezvous completed.
    #[error("handoff channel closed by peer")]
    ChannelClosed,

    /// I/O on the handoff channel failed.
    #[error("handoff channel I/O failed: {source}")]
    Channel {
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The peer sent a message out of protocol order.
    #[error("unexpected handoff message: expected {expected}, received {received}")]
    Protocol {
        /// Message the receiver was waiting for.
        expected: &'static str,
        /// Message that actually arrived.
        received: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// The containerized command finished with a non-zero status.
    #[error("container process exited with status {status}")]
    ContainerExit {
        /// Exit status of the container init process.
        status: i32,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CaskError>;
