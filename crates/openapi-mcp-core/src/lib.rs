//! # openapi-mcp-core
//!
//! Protocol foundation shared by every openapi-mcp crate: JSON-RPC 2.0 wire
//! types, the MCP tool surface, the [`McpHandler`] trait and the request router
//! that maps one onto the other.
//!
//! ```text
//! openapi-mcp-core/
//! ├── error      # McpError and JSON-RPC error codes
//! ├── jsonrpc    # Incoming/outgoing wire messages
//! ├── types      # ServerInfo, Tool, ToolResult
//! ├── context    # Per-request transport metadata
//! ├── handler    # McpHandler trait
//! └── router     # route_request dispatch
//! ```

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod context;
pub mod error;
pub mod handler;
pub mod jsonrpc;
pub mod router;
pub mod types;

pub use context::{RequestContext, TransportType};
pub use error::{ErrorKind, McpError, McpResult};
pub use handler::McpHandler;
pub use jsonrpc::{JsonRpcError, JsonRpcIncoming, JsonRpcOutgoing};
pub use router::route_request;
pub use types::{Content, ServerInfo, Tool, ToolInputSchema, ToolResult};

/// MCP protocol version advertised when the client requests none or an
/// unsupported one.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Protocol versions a client may negotiate.
pub const SUPPORTED_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];
