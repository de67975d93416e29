//! # openapi-mcp-proxy
//!
//! Serve an OpenAPI-described REST API as an MCP server.
//!
//! Two modes:
//!
//! - **stdio** (default): one server instance on stdin/stdout, living until
//!   stdin closes.
//! - **SSE** (`--sse` or `ENABLE_SSE=true`): an HTTP listener where every
//!   `GET /events` gets its own server instance, and messages arrive as
//!   `POST /events?sessionId=<id>`.
//!
//! ```text
//! openapi-mcp-proxy/
//! ├── config     # ModeConfig / ProxyConfig resolution
//! ├── locator    # bundled openapi.json next to the executable
//! ├── factory    # ProxyFactory: one server per session
//! ├── registry   # SessionRegistry for SSE routing
//! ├── streaming  # axum routes for GET/POST /events
//! ├── duplex     # stdio bootstrap
//! └── cli        # entry point and error display
//! ```

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod duplex;
pub mod error;
pub mod factory;
pub mod locator;
pub mod registry;
pub mod streaming;

pub use config::{DEFAULT_PORT, ModeConfig, ProxyConfig};
pub use error::{ProxyError, ProxyResult};
pub use factory::{OpenApiProxyFactory, ProxyFactory};
pub use registry::SessionRegistry;
pub use streaming::{EVENTS_PATH, router, run_streaming};
