//! Construction of protocol-server instances.
//!
//! Streaming mode builds one instance per accepted stream, so construction is
//! behind a trait the HTTP layer is generic over.

use std::future::Future;
use std::path::PathBuf;

use openapi_mcp_core::McpHandler;
use openapi_mcp_openapi::{OpenApiHandler, init_proxy};
use openapi_mcp_server::McpServer;

use crate::error::ProxyResult;

/// Builds a fresh protocol-server instance on every call.
pub trait ProxyFactory: Send + Sync + 'static {
    /// Handler type of the built servers.
    type Handler: McpHandler;

    /// Build a new, unconnected server.
    fn build(&self) -> impl Future<Output = ProxyResult<McpServer<Self::Handler>>> + Send + '_;
}

/// Factory that loads an OpenAPI document from disk for every instance.
#[derive(Debug, Clone)]
pub struct OpenApiProxyFactory {
    spec_path: PathBuf,
    base_url: Option<String>,
}

impl OpenApiProxyFactory {
    /// Create a factory for the document at `spec_path`.
    pub fn new(spec_path: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        Self {
            spec_path: spec_path.into(),
            base_url,
        }
    }
}

impl ProxyFactory for OpenApiProxyFactory {
    type Handler = OpenApiHandler;

    fn build(&self) -> impl Future<Output = ProxyResult<McpServer<OpenApiHandler>>> + Send + '_ {
        async move { Ok(init_proxy(&self.spec_path, self.base_url.as_deref()).await?) }
    }
}
