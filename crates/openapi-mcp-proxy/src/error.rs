//! Error types for openapi-mcp-proxy

use std::net::SocketAddr;

use openapi_mcp_openapi::{OpenApiError, ValidationError};
use openapi_mcp_server::TransportError;
use thiserror::Error;

/// Result type for proxy operations
pub type ProxyResult<T> = std::result::Result<T, ProxyError>;

/// Main error type for openapi-mcp-proxy
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProxyError {
    /// Loading or validating the OpenAPI document failed.
    #[error(transparent)]
    OpenApi(#[from] OpenApiError),

    /// Attaching a server to a channel, or serving on it, failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Invalid proxy configuration.
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is wrong
        message: String,
    },

    /// The HTTP listener could not be bound.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// Requested address
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The HTTP listener stopped with an error.
    #[error("HTTP server error on {addr}: {source}")]
    Serve {
        /// Bound address
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// The validation problems, when this error is a spec validation failure.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::OpenApi(OpenApiError::Validation(err)) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_accessor() {
        let err = ProxyError::from(OpenApiError::from(ValidationError::new(vec![
            "/info: required object is missing".into(),
        ])));
        assert_eq!(err.validation().map(|v| v.errors.len()), Some(1));
        assert!(ProxyError::configuration("x").validation().is_none());
    }

    #[test]
    fn test_transport_error_message() {
        let err = ProxyError::from(TransportError::Closed);
        assert!(err.to_string().starts_with("Transport error"));
    }
}
