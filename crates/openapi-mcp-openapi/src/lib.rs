//! # openapi-mcp-openapi
//!
//! Turn an OpenAPI 3.x document into an MCP server at runtime.
//!
//! Every operation in the document becomes one MCP tool. Calling the tool
//! performs the HTTP request against the API's base URL and returns the
//! response body.
//!
//! ```rust,ignore
//! use openapi_mcp_openapi::init_proxy;
//!
//! let server = init_proxy(Path::new("openapi.json"), Some("http://localhost:8080")).await?;
//! server.connect(transport).await?.waiting().await?;
//! ```

#![deny(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod handler;
mod parser;
mod provider;
mod validate;

use std::path::Path;

use openapi_mcp_server::McpServer;

pub use error::{OpenApiError, Result, ValidationError};
pub use handler::OpenApiHandler;
pub use parser::{load_from_file, parse_document, parse_spec};
pub use provider::{ExtractedOperation, ExtractedParameter, OpenApiProvider, ParameterLocation};
pub use validate::validate_document;

/// Build a protocol-server instance for the document at `spec_path`.
///
/// `base_url` overrides the first server URL declared in the document.
///
/// # Errors
///
/// [`OpenApiError::Validation`] when the document is structurally invalid,
/// [`OpenApiError::Io`] or [`OpenApiError::Parse`] when it cannot be read,
/// [`OpenApiError::InvalidUrl`] for a malformed override.
pub async fn init_proxy(spec_path: &Path, base_url: Option<&str>) -> Result<McpServer<OpenApiHandler>> {
    let spec = load_from_file(spec_path).await?;

    let mut provider = OpenApiProvider::from_spec(&spec);
    if let Some(base_url) = base_url {
        provider = provider.with_base_url(base_url)?;
    }

    if provider.base_url().is_none() {
        tracing::warn!(
            spec = %spec_path.display(),
            "no base URL configured; tool calls will fail until BASE_URL is set"
        );
    }
    tracing::debug!(
        title = provider.title(),
        tools = provider.operations().len(),
        "loaded OpenAPI specification"
    );

    Ok(McpServer::new(provider.into_handler()))
}
