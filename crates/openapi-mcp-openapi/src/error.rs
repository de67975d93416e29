//! Error types for OpenAPI loading and execution.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for OpenAPI operations.
pub type Result<T> = std::result::Result<T, OpenApiError>;

/// The document parsed but is not a usable OpenAPI description.
///
/// `errors` is never empty and keeps the order in which problems were found.
/// Each entry is prefixed with the JSON pointer of the offending node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid OpenAPI specification ({} problem(s))", errors.len())]
pub struct ValidationError {
    /// Human-readable messages, one per problem.
    pub errors: Vec<String>,
}

impl ValidationError {
    /// Build from a list of messages.
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }
}

/// Errors that can occur while loading a spec or calling an operation.
#[derive(Debug, Error)]
pub enum OpenApiError {
    /// Structural validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Failed to read the spec file.
    #[error("failed to read OpenAPI spec file {}: {source}", path.display())]
    Io {
        /// The file that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is neither valid JSON nor valid YAML.
    #[error("failed to parse OpenAPI spec: {0}")]
    Parse(String),

    /// Invalid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL cannot carry a path (e.g. `mailto:`).
    #[error("base URL cannot be used for API calls: {0}")]
    InvalidBaseUrl(String),

    /// No override was given and the spec declares no absolute server URL.
    #[error("base URL not configured - set BASE_URL or declare an absolute server URL in the spec")]
    NoBaseUrl,

    /// A required parameter was not supplied.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// The HTTP request could not be performed.
    #[error("HTTP request failed: {0}")]
    Fetch(#[from] reqwest::Error),
}

impl From<serde_json::Error> for OpenApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for OpenApiError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
