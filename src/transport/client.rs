//! Outbound OSC over UDP.
//!
//! Every [`OscClient::send`] produces exactly one datagram. There is no
//! acknowledgement, retry or ordering guarantee beyond what UDP gives on
//! loopback.

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::{MAX_DATAGRAM_SIZE, Message, encode};

// ============================================================================
// OscClient
// ============================================================================

/// Sends encoded OSC messages to a fixed target.
///
/// The socket is not `connect`ed, so an ICMP "port unreachable" from a DAW
/// that is not running never turns into an error on a later send.
///
/// # Example
///
/// ```ignore
/// let client = OscClient::bind("127.0.0.1:8000".parse()?).await?;
/// client.send(&Message::trigger("/stop")).await?;
/// ```
#[derive(Debug)]
pub struct OscClient {
    /// Local socket used for sending.
    socket: UdpSocket,
    /// DAW address every message goes to.
    target: SocketAddr,
}

impl OscClient {
    /// Creates a client bound to `local`, sending to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the local socket cannot be bound.
    pub async fn connect(local: SocketAddr, target: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| Error::transport(format!("failed to bind {local}: {e}")))?;

        debug!(
            local = ?socket.local_addr().ok(),
            %target,
            "OSC client ready"
        );

        Ok(Self { socket, target })
    }

    /// Creates a client on an ephemeral local port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if no local socket can be bound.
    pub async fn bind(target: SocketAddr) -> Result<Self> {
        let unspecified = match target.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        Self::connect(SocketAddr::new(unspecified, 0), target).await
    }

    /// Sends one message as one datagram.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the message is too large for a
    /// datagram or the OS refuses the send.
    pub async fn send(&self, message: &Message) -> Result<()> {
        let bytes = encode(message);
        if bytes.len() > MAX_DATAGRAM_SIZE {
            return Err(Error::transport(format!(
                "message to {} is {} bytes, exceeds datagram limit",
                message.address(),
                bytes.len()
            )));
        }

        self.socket
            .send_to(&bytes, self.target)
            .await
            .map_err(|e| Error::transport(format!("send to {} failed: {e}", self.target)))?;

        trace!(address = %message.address(), len = bytes.len(), "OSC sent");
        Ok(())
    }

    /// Returns the DAW address.
    #[inline]
    #[must_use]
    pub const fn target(&self) -> SocketAddr {
        self.target
    }

    /// Returns the local socket address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the OS cannot report it.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

// ============================================================================
// Tests
// ============================================================================
