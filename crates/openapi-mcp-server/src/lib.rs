//! # openapi-mcp-server
//!
//! Runs an [`McpHandler`](openapi_mcp_core::McpHandler) over a transport.
//!
//! - [`McpServer`] wraps a handler; [`McpServer::connect`] attaches it to a
//!   [`Transport`] and spawns the serving loop.
//! - [`transport::stdio`] serves newline-delimited JSON-RPC on stdin/stdout.
//! - [`transport::sse`] provides the per-session channel behind an SSE
//!   `GET`/`POST` pair.
//!
//! ```rust,ignore
//! use openapi_mcp_server::{McpServer, transport::stdio};
//!
//! let server = McpServer::new(handler);
//! server.connect(stdio::stdio()).await?.waiting().await?;
//! ```

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod service;
pub mod transport;

pub use error::TransportError;
pub use service::{McpServer, RunningService};
pub use transport::{LineTransport, MAX_MESSAGE_SIZE, Transport};

#[cfg(feature = "sse")]
pub use transport::sse::{SseChannel, SseEventStream, SseTransport};
