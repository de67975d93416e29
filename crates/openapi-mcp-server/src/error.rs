//! Transport error type.

use thiserror::Error;

/// Errors raised by transports and the serving loop.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// The channel was closed (client disconnected or server shut down).
    #[error("transport closed")]
    Closed,

    /// `start` was called on a transport that is already serving.
    #[error("transport already started")]
    AlreadyStarted,

    /// A message arrived before a server was connected to the channel.
    #[error("SSE connection not established")]
    NotConnected,

    /// Inbound payload is not a well-formed JSON-RPC message.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Inbound line exceeded the size cap.
    #[error("message of {size} bytes exceeds maximum size of {max} bytes")]
    MessageTooLarge {
        /// Observed size in bytes
        size: usize,
        /// Configured cap in bytes
        max: usize,
    },

    /// Underlying reader/writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serving task panicked or was aborted.
    #[error("serving task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl TransportError {
    /// Whether the serving loop can keep reading after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidMessage(_) | Self::MessageTooLarge { .. })
    }
}
