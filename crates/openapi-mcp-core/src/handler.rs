//! The `McpHandler` trait implemented by protocol servers.
//!
//! A handler describes the tools a server exposes and executes calls to them.
//! Transports never talk to a handler directly; they hand parsed messages to
//! [`crate::router::route_request`].
//!
//! ```rust
//! use std::future::Future;
//! use serde_json::Value;
//! use openapi_mcp_core::context::RequestContext;
//! use openapi_mcp_core::error::{McpError, McpResult};
//! use openapi_mcp_core::handler::McpHandler;
//! use openapi_mcp_core::types::{ServerInfo, Tool, ToolResult};
//!
//! #[derive(Clone)]
//! struct Echo;
//!
//! impl McpHandler for Echo {
//!     fn server_info(&self) -> ServerInfo {
//!         ServerInfo::new("echo", "1.0.0")
//!     }
//!
//!     fn list_tools(&self) -> Vec<Tool> {
//!         vec![Tool::new("echo", "Echo the arguments back")]
//!     }
//!
//!     fn call_tool<'a>(
//!         &'a self,
//!         name: &'a str,
//!         args: Value,
//!         _ctx: &'a RequestContext,
//!     ) -> impl Future<Output = McpResult<ToolResult>> + Send + 'a {
//!         async move {
//!             match name {
//!                 "echo" => Ok(ToolResult::text(args.to_string())),
//!                 _ => Err(McpError::tool_not_found(name)),
//!             }
//!         }
//!     }
//! }
//! ```

use std::future::Future;

use serde_json::Value;

use crate::context::RequestContext;
use crate::error::McpResult;
use crate::types::{ServerInfo, Tool, ToolResult};

/// The MCP handler trait.
///
/// Handlers are cloned into every dispatched request task, so cloning should be
/// cheap (wrap heavy state in an `Arc`).
pub trait McpHandler: Clone + Send + Sync + 'static {
    /// Returns server information for the `initialize` handshake.
    fn server_info(&self) -> ServerInfo;

    /// Returns all available tools.
    fn list_tools(&self) -> Vec<Tool>;

    /// Calls a tool by name with the given arguments.
    ///
    /// `args` is the raw `arguments` object from the request, or `Value::Null`
    /// when the client sent none.
    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        args: Value,
        ctx: &'a RequestContext,
    ) -> impl Future<Output = McpResult<ToolResult>> + Send + 'a;
}
