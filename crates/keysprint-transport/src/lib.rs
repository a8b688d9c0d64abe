//! Transport layer for Keysprint.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract the
//! network protocol away from the lobby logic, plus [`BroadcastHub`], the
//! fan-out primitive the orchestrator uses to scope outbound events to a
//! single client, a room, or everyone connected.
//!
//! Frames are UTF-8 text (JSON events) because the clients are browsers.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod hub;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use hub::BroadcastHub;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Assigned by the transport when a connection is accepted; the lobby layer
/// uses it to address outbound traffic without holding the socket itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Gracefully shuts down the transport, stopping new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single connection that can send and receive text frames.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one text frame to the peer.
    async fn send_text(&self, text: &str) -> Result<(), Self::Error>;

    /// Receives the next text frame. `Ok(None)` means the peer closed
    /// the connection cleanly.
    async fn recv_text(&self) -> Result<Option<String>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns this connection's identifier.
    fn id(&self) -> ConnectionId;
}
