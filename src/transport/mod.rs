//! Line transports.
//!
//! A connection is split into an [`Inbound`] half, read only by that
//! connection's dispatcher, and an [`Outbound`] half, written only by that
//! connection's writer task. Keeping the halves apart lets a broadcast reach
//! a peer while its dispatcher is parked on a read.

use crate::protocol::ServerMessage;

/// Receiving half of a client connection.
#[async_trait::async_trait]
pub trait Inbound: Send {
    /// Next line from the peer without its terminator. `Ok(None)` on a clean
    /// close; errors mean the connection is unusable.
    async fn recv_line(&mut self) -> anyhow::Result<Option<String>>;
}

/// Sending half of a client connection.
#[async_trait::async_trait]
pub trait Outbound: Send {
    async fn send(&mut self, msg: &ServerMessage) -> anyhow::Result<()>;
    /// Flush and close the sending direction.
    async fn close(&mut self) -> anyhow::Result<()>;
}

pub mod in_memory;
pub mod tcp;
