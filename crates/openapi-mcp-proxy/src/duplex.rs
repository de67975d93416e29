//! Stdio mode: a single protocol-server instance on stdin/stdout.

use openapi_mcp_server::Transport;
use openapi_mcp_server::transport::stdio;

use crate::error::ProxyResult;
use crate::factory::ProxyFactory;

/// Serve one instance on this process's stdin/stdout until stdin closes.
///
/// # Errors
///
/// Fails if the instance cannot be built or the transport fails.
pub async fn run_duplex<F: ProxyFactory>(factory: &F) -> ProxyResult<()> {
    serve_duplex(factory, stdio::stdio()).await
}

/// Serve one instance on `transport` until the peer goes away.
///
/// # Errors
///
/// Fails if the instance cannot be built or the transport fails.
pub async fn serve_duplex<F: ProxyFactory, T: Transport>(factory: &F, transport: T) -> ProxyResult<()> {
    let server = factory.build().await?;
    let running = server.connect(transport).await?;
    tracing::info!("serving MCP on stdio");

    running.waiting().await?;
    tracing::info!("stdio closed, shutting down");
    Ok(())
}
