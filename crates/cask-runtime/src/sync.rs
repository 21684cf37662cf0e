//! Parent/child rendezvous for the network handoff.
//!
//! Two unidirectional typed channels over a `UnixStream` pair, created
//! before `clone(2)` and inherited across it. The protocol is a strict
//! two-phase rendezvous:
//!
//! 1. host → child [`HandoffMessage::NetnsCreated`] — `ip netns add` done,
//!    the child may bind-mount its namespace over the entry;
//! 2. child → host [`HandoffMessage::NetnsRegistered`] — the bind mount is
//!    visible, the host may move the veth end into the namespace;
//! 3. host → child [`HandoffMessage::NetworkConfigured`] — plumbing is up,
//!    the child may exec the user command.
//!
//! `clone(2)` duplicates the descriptor table, so each process closes the
//! duplicates it does not own right after the clone: the child drops the
//! host-side descriptors, and the parent drops its copies of the child
//! side (handed across the clone as raw descriptors). Only then does a
//! peer dying mid-protocol surface as a closed channel instead of a hang.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd, RawFd};
use std::os::unix::net::UnixStream;

use serde::{Deserialize, Serialize};

use cask_common::error::{CaskError, Result};

/// Messages exchanged during the rendezvous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandoffMessage {
    /// The named network namespace entry exists.
    NetnsCreated,
    /// The child bind-mounted its namespace over the entry.
    NetnsRegistered,
    /// The veth pair, addresses, and default route are in place.
    NetworkConfigured,
}

impl HandoffMessage {
    fn name(self) -> &'static str {
        match self {
            Self::NetnsCreated => "NetnsCreated",
            Self::NetnsRegistered => "NetnsRegistered",
            Self::NetworkConfigured => "NetworkConfigured",
        }
    }
}

/// The half of the rendezvous held by the parent's network worker.
#[derive(Debug)]
pub struct HostHandoff {
    tx: UnixStream,
    rx: BufReader<UnixStream>,
}

/// The half of the rendezvous held by the container init process.
#[derive(Debug)]
pub struct ChildHandoff {
    tx: UnixStream,
    rx: BufReader<UnixStream>,
}

/// Creates the connected pair of rendezvous handles.
///
/// # Errors
///
/// Returns an error if a socket pair cannot be created.
pub fn handoff() -> Result<(HostHandoff, ChildHandoff)> {
    let (host_tx, child_rx) = stream_pair()?;
    let (child_tx, host_rx) = stream_pair()?;
    Ok((
        HostHandoff {
            tx: host_tx,
            rx: BufReader::new(host_rx),
        },
        ChildHandoff {
            tx: child_tx,
            rx: BufReader::new(child_rx),
        },
    ))
}

fn stream_pair() -> Result<(UnixStream, UnixStream)> {
    UnixStream::pair().map_err(|e| CaskError::Channel { source: e })
}

/// Closes inherited descriptor copies belonging to the other side.
///
/// `clone(2)` duplicates the whole descriptor table, so the child must
/// drop the host-side descriptors (and vice versa) for end-of-file to
/// mean "peer died".
pub fn close_inherited(fds: &[RawFd]) {
    for &fd in fds {
        let _ = nix::unistd::close(fd);
    }
}

impl HostHandoff {
    /// Announces that `ip netns add` succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel write fails.
    pub fn announce_netns_created(&mut self) -> Result<()> {
        send(&mut self.tx, HandoffMessage::NetnsCreated)
    }

    /// Blocks until the child has registered its network namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel breaks or the protocol is violated.
    pub fn wait_netns_registered(&mut self) -> Result<()> {
        expect(&mut self.rx, HandoffMessage::NetnsRegistered)
    }

    /// Announces that all network plumbing is in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel write fails.
    pub fn announce_network_configured(&mut self) -> Result<()> {
        send(&mut self.tx, HandoffMessage::NetworkConfigured)
    }

    /// Returns the raw descriptors of this half, for [`close_inherited`].
    #[must_use]
    pub fn raw_fds(&self) -> [RawFd; 2] {
        [self.tx.as_raw_fd(), self.rx.get_ref().as_raw_fd()]
    }
}

impl ChildHandoff {
    /// Blocks until the parent has created the named namespace entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel breaks or the protocol is violated.
    pub fn wait_netns_created(&mut self) -> Result<()> {
        expect(&mut self.rx, HandoffMessage::NetnsCreated)
    }

    /// Confirms the namespace bind mount to the parent.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel write fails.
    pub fn confirm_netns_registered(&mut self) -> Result<()> {
        send(&mut self.tx, HandoffMessage::NetnsRegistered)
    }

    /// Blocks until the parent has finished the network plumbing.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel breaks or the protocol is violated.
    pub fn wait_network_configured(&mut self) -> Result<()> {
        expect(&mut self.rx, HandoffMessage::NetworkConfigured)
    }

    /// Dissolves the handle into its raw descriptors so it can cross
    /// `clone(2)` without leaving an owned copy in the parent.
    ///
    /// The parent passes the array to the init closure and closes its own
    /// duplicates with [`close_inherited`] once the clone has returned.
    #[must_use]
    pub fn into_raw_fds(self) -> [RawFd; 2] {
        [self.tx.into_raw_fd(), self.rx.into_inner().into_raw_fd()]
    }

    /// Reassembles the handle inside the cloned process.
    ///
    /// # Safety
    ///
    /// `fds` must be the array produced by [`Self::into_raw_fds`], and the
    /// calling process must take ownership of those descriptors exactly
    /// once.
    #[must_use]
    pub unsafe fn from_raw_fds(fds: [RawFd; 2]) -> Self {
        Self {
            tx: UnixStream::from_raw_fd(fds[0]),
            rx: BufReader::new(UnixStream::from_raw_fd(fds[1])),
        }
    }
}

fn send(tx: &mut UnixStream, message: HandoffMessage) -> Result<()> {
    let mut payload = serde_json::to_vec(&message)?;
    payload.push(b'\n');
    tx.write_all(&payload)
        .map_err(|e| CaskError::Channel { source: e })?;
    tracing::trace!(message = message.name(), "handoff message sent");
    Ok(())
}

fn expect(rx: &mut BufReader<UnixStream>, expected: HandoffMessage) -> Result<()> {
    let mut line = String::new();
    let read = rx
        .read_line(&mut line)
        .map_err(|e| CaskError::Channel { source: e })?;
    if read == 0 {
        return Err(CaskError::ChannelClosed);
    }

    let received: HandoffMessage = serde_json::from_str(line.trim_end())?;
    if received == expected {
        tracing::trace!(message = received.name(), "handoff message received");
        Ok(())
    } else {
        Err(CaskError::Protocol {
            expected: expected.name(),
            received: received.name().to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_protocol_roundtrip() {
        let (mut host, mut child) = handoff().expect("handoff pair");

        let child_side = std::thread::spawn(move || {
            child.wait_netns_created().expect("ns created");
            child.confirm_netns_registered().expect("confirm");
            child.wait_network_configured().expect("network up");
        });

        host.announce_netns_created().expect("announce ns");
        host.wait_netns_registered().expect("registered");
        host.announce_network_configured().expect("announce net");

        child_side.join().expect("child thread");
    }

    #[test]
    fn dead_host_unblocks_waiting_child() {
        let (host, mut child) = handoff().expect("handoff pair");
        drop(host);

        let err = child.wait_netns_created().unwrap_err();
        assert!(matches!(err, CaskError::ChannelClosed));
    }

    #[test]
    fn dead_child_unblocks_waiting_host() {
        let (mut host, child) = handoff().expect("handoff pair");
        drop(child);

        let err = host.wait_netns_registered().unwrap_err();
        assert!(matches!(err, CaskError::ChannelClosed));
    }

    #[test]
    fn child_half_survives_the_raw_fd_handover() {
        let (mut host, child) = handoff().expect("handoff pair");

        let fds = child.into_raw_fds();
        // SAFETY: the descriptors come straight from into_raw_fds and are
        // reclaimed exactly once.
        let mut child = unsafe { ChildHandoff::from_raw_fds(fds) };

        host.announce_netns_created().expect("send");
        child.wait_netns_created().expect("recv");
        child.confirm_netns_registered().expect("ack");
        host.wait_netns_registered().expect("recv ack");
    }

    #[test]
    fn out_of_order_message_is_a_protocol_error() {
        let (mut host, mut child) = handoff().expect("handoff pair");

        host.announce_network_configured().expect("send");
        let err = child.wait_netns_created().unwrap_err();
        match err {
            CaskError::Protocol { expected, received } => {
                assert_eq!(expected, "NetnsCreated");
                assert_eq!(received, "NetworkConfigured");
            }
            other => panic!("expected Protocol error, got {other}"),
        }
    }
}
