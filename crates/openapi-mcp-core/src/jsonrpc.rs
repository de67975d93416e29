//! JSON-RPC 2.0 wire types.
//!
//! Routers parse [`JsonRpcIncoming`] without knowing upfront whether a message
//! is a request or a notification, and answer with [`JsonRpcOutgoing`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::McpError;

/// JSON-RPC version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new error
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        Self {
            code: err.jsonrpc_code(),
            message: err.message,
            data: None,
        }
    }
}

/// Incoming JSON-RPC message - can be request or notification.
///
/// ```rust
/// use openapi_mcp_core::jsonrpc::JsonRpcIncoming;
///
/// let request = JsonRpcIncoming::parse(r#"{"jsonrpc": "2.0", "id": 1, "method": "ping"}"#).unwrap();
/// assert!(request.is_request());
///
/// let notification =
///     JsonRpcIncoming::parse(r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#).unwrap();
/// assert!(notification.is_notification());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcIncoming {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID (None for notifications)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcIncoming {
    /// Create a request with an id.
    #[must_use]
    pub fn request(id: Value, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// Check if this is a request (has an ID)
    #[must_use]
    pub fn is_request(&self) -> bool {
        self.id.is_some()
    }

    /// Check if this is a notification (no ID)
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Parse from JSON string
    pub fn parse(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

/// Outgoing JSON-RPC response.
///
/// A response with no id, result or error is a notification acknowledgment and
/// is never written to the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcOutgoing {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID (echoed from request, None for notifications/parse errors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Result (mutually exclusive with error)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error (mutually exclusive with result)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcOutgoing {
    /// Create a success response
    #[must_use]
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    #[must_use]
    pub fn error(id: Option<Value>, error: impl Into<JsonRpcError>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Create a notification acknowledgment (should not be sent over wire)
    #[must_use]
    pub fn notification_ack() -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            result: None,
            error: None,
        }
    }

    /// Whether this response should be written to the transport.
    #[must_use]
    pub fn should_send(&self) -> bool {
        self.id.is_some() || self.result.is_some() || self.error.is_some()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_incoming_defaults_missing_params() {
        let incoming = JsonRpcIncoming::parse(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#)
            .unwrap();
        assert_eq!(incoming.id, Some(json!("a")));
        assert!(incoming.params.is_none());
    }

    #[test]
    fn test_incoming_requires_method() {
        assert!(JsonRpcIncoming::parse(r#"{"jsonrpc":"2.0","id":1}"#).is_err());
    }

    #[test]
    fn test_outgoing_error_shape() {
        let response = JsonRpcOutgoing::error(Some(json!(7)), McpError::method_not_found("nope"));
        let value: Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["error"]["code"], -32601);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_notification_ack_not_sent() {
        assert!(!JsonRpcOutgoing::notification_ack().should_send());
    }
}
