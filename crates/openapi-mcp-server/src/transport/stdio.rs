//! STDIO transport.
//!
//! Line-based JSON-RPC over the process's stdin/stdout. Nothing else may write
//! to stdout while this transport is serving; logs go to stderr.

use tokio::io::{BufReader, Stdin, Stdout};

use super::LineTransport;

/// The stdio transport type.
pub type StdioTransport = LineTransport<BufReader<Stdin>, Stdout>;

/// Create a transport bound to this process's stdin and stdout.
///
/// ```rust,ignore
/// use openapi_mcp_server::transport::stdio;
///
/// let running = server.connect(stdio::stdio()).await?;
/// running.waiting().await?;
/// ```
pub fn stdio() -> StdioTransport {
    LineTransport::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
}
