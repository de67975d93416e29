//! Command-line entry point.
//!
//! ```text
//! openapi-mcp-proxy [--sse] [--port <port>]
//!
//! ENABLE_SSE=true   same as --sse
//! PORT=<port>       listening port (default 3000, --port wins)
//! BASE_URL=<url>    API base URL (default: first server in the spec)
//! RUST_LOG=<filter> log filter (default: info), logs go to stderr
//! ```

pub mod error;

use std::io::IsTerminal;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use crate::config::ProxyConfig;
use crate::duplex::run_duplex;
use crate::error::ProxyResult;
use crate::factory::OpenApiProxyFactory;
use crate::streaming::run_streaming;

/// openapi-mcp-proxy - serve an OpenAPI-described REST API as MCP tools
///
/// Parsing is lenient: unknown arguments and unusable `--port` values are
/// ignored rather than rejected.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "openapi-mcp-proxy",
    version,
    about = "Serve an OpenAPI-described REST API as MCP tools over stdio or SSE",
    ignore_errors = true
)]
pub struct Cli {
    /// Serve SSE over HTTP instead of stdio (same as ENABLE_SSE=true)
    #[arg(long)]
    pub sse: bool,

    /// Listening port in SSE mode; only the first occurrence counts
    #[arg(long, value_name = "PORT", action = ArgAction::Append, allow_hyphen_values = true)]
    pub port: Vec<String>,

    /// Unrecognized arguments
    #[arg(hide = true, allow_hyphen_values = true)]
    pub ignored: Vec<String>,
}

impl Cli {
    /// Resolve the startup configuration from the parsed flags and this
    /// process's environment.
    ///
    /// # Errors
    ///
    /// Fails if the bundled document cannot be located.
    pub fn config(&self) -> ProxyResult<ProxyConfig> {
        ProxyConfig::from_env(self.sse, self.port.first().map(String::as_str))
    }

    /// Run the proxy in the configured mode.
    ///
    /// # Errors
    ///
    /// In stdio mode, any failure to build or serve the instance. In SSE mode,
    /// only listener failures; per-session errors are logged.
    pub async fn execute(self) -> ProxyResult<()> {
        if !std::io::stderr().is_terminal() {
            colored::control::set_override(false);
        }

        if !self.ignored.is_empty() {
            tracing::debug!(args = ?self.ignored, "ignoring unrecognized arguments");
        }

        let config = self.config()?;
        tracing::debug!(
            spec = %config.spec_path.display(),
            base_url = ?config.base_url,
            streaming = config.mode.streaming_enabled,
            "starting"
        );

        let factory = OpenApiProxyFactory::new(config.spec_path.clone(), config.base_url.clone());
        if config.mode.streaming_enabled {
            run_streaming(factory, &config.bind_addr(), shutdown_signal()).await
        } else {
            run_duplex(&factory).await
        }
    }
}

/// Install the tracing subscriber. Logs go to stderr; stdout carries the
/// stdio protocol.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Ctrl+C received, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("SIGTERM received, initiating shutdown");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
