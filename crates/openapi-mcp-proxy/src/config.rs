//! Startup configuration.
//!
//! Everything is resolved once from the parsed command line and the
//! environment. Environment lookups are injected so resolution stays pure and
//! testable.

use std::path::PathBuf;

use crate::error::{ProxyError, ProxyResult};
use crate::locator;

/// Port used when neither `PORT` nor `--port` supplies a usable value.
pub const DEFAULT_PORT: u16 = 3000;

/// Address the SSE listener binds to.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Transport selection and listening port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeConfig {
    /// Serve SSE over HTTP instead of stdio.
    pub streaming_enabled: bool,
    /// Listening port; only meaningful when streaming.
    pub port: u16,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            streaming_enabled: false,
            port: DEFAULT_PORT,
        }
    }
}

impl ModeConfig {
    /// Resolve the mode from the `--sse` flag, the first `--port` value and
    /// environment lookups.
    ///
    /// - Streaming is enabled by `sse_flag` or `ENABLE_SSE=true` (exact match).
    /// - The port is `3000`, replaced by `PORT` if it parses, replaced again
    ///   by `port_arg` if that parses. Values that do not parse are ignored.
    pub fn resolve<F>(sse_flag: bool, port_arg: Option<&str>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let streaming_enabled = sse_flag || env("ENABLE_SSE").as_deref() == Some("true");

        let mut port = DEFAULT_PORT;
        if let Some(value) = env("PORT").as_deref().and_then(parse_port) {
            port = value;
        }
        if let Some(value) = port_arg.and_then(parse_port) {
            port = value;
        }

        Self {
            streaming_enabled,
            port,
        }
    }
}

/// Whole-value parse after trimming. A numeric prefix such as `4100abc` is
/// rejected rather than read as `4100`.
fn parse_port(value: &str) -> Option<u16> {
    value.trim().parse().ok()
}

/// Complete proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Transport mode and port.
    pub mode: ModeConfig,
    /// Absolute path of the OpenAPI document.
    pub spec_path: PathBuf,
    /// Override for the API base URL.
    pub base_url: Option<String>,
    /// Host the SSE listener binds to.
    pub bind_host: String,
}

impl ProxyConfig {
    /// Assemble the configuration from explicit inputs.
    ///
    /// An empty `BASE_URL` counts as unset.
    pub fn resolve<F>(sse_flag: bool, port_arg: Option<&str>, env: F, spec_path: PathBuf) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = ModeConfig::resolve(sse_flag, port_arg, &env);
        let base_url = env("BASE_URL").filter(|url| !url.is_empty());

        Self {
            mode,
            spec_path,
            base_url,
            bind_host: DEFAULT_BIND_HOST.to_string(),
        }
    }

    /// Assemble the configuration from parsed flags and this process's
    /// environment, with the document bundled next to the executable.
    ///
    /// # Errors
    ///
    /// Fails if the executable's location cannot be determined.
    pub fn from_env(sse_flag: bool, port_arg: Option<&str>) -> ProxyResult<Self> {
        let spec_path = locator::locate_spec().map_err(|e| {
            ProxyError::configuration(format!("cannot locate {}: {e}", locator::SPEC_FILE_NAME))
        })?;
        Ok(Self::resolve(sse_flag, port_arg, |key| std::env::var(key).ok(), spec_path))
    }

    /// `host:port` for the SSE listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.mode.port)
    }
}
