//! Transport abstraction shared by the stdio and SSE channels.
//!
//! Every transport follows the same shape: it is started once, yields raw
//! inbound messages until the peer goes away, accepts serialized responses,
//! and is closed exactly once by the serving loop.

use async_trait::async_trait;
use openapi_mcp_core::context::RequestContext;

use crate::error::TransportError;

mod line;

#[cfg(feature = "stdio")]
pub mod stdio;

#[cfg(feature = "sse")]
pub mod sse;

pub use line::LineTransport;

/// Maximum message size for line-based transports (10 MiB).
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// A bidirectional message channel a server can be connected to.
///
/// `receive` must be cancel-safe: the serving loop races it against outgoing
/// responses in `tokio::select!`.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Prepare the channel for serving. Fails if the channel is already closed
    /// or already attached to a server.
    async fn start(&mut self) -> Result<(), TransportError>;

    /// Next raw inbound message, or `None` once the peer has gone away.
    async fn receive(&mut self) -> Result<Option<String>, TransportError>;

    /// Deliver one serialized JSON-RPC message to the peer.
    async fn send(&mut self, message: String) -> Result<(), TransportError>;

    /// Release the channel. Idempotent.
    async fn close(&mut self);

    /// Context attached to every request read from this transport.
    fn context(&self) -> RequestContext;
}
