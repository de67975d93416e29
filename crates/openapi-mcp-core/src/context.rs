//! Per-request context handed to handlers.

/// Transport type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportType {
    /// Standard I/O transport
    #[default]
    Stdio,
    /// HTTP Server-Sent Events transport
    Sse,
}

impl TransportType {
    /// Returns the transport name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Sse => "sse",
        }
    }
}

/// Request metadata.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Transport the request arrived on
    pub transport: TransportType,
    /// Streaming session the request belongs to, if any
    pub session_id: Option<String>,
}

impl RequestContext {
    /// Context for a request read from stdin.
    #[must_use]
    pub fn stdio() -> Self {
        Self::default()
    }

    /// Context for a request posted to a streaming session.
    #[must_use]
    pub fn sse(session_id: impl Into<String>) -> Self {
        Self {
            transport: TransportType::Sse,
            session_id: Some(session_id.into()),
        }
    }
}
