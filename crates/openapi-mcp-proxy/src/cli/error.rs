//! User-facing error output for the binary.

use colored::Colorize;

use crate::error::ProxyError;

/// Format an error for display on stderr.
///
/// Validation failures print a header followed by one problem per line.
#[must_use]
pub fn format_error(error: &ProxyError) -> String {
    if let Some(validation) = error.validation() {
        let mut out = "Invalid OpenAPI specification:".red().bold().to_string();
        for message in &validation.errors {
            out.push('\n');
            out.push_str(message);
        }
        return out;
    }

    match error {
        ProxyError::Bind { .. } => format!(
            "{} {}\n\n{}\n  {}",
            "Error:".red().bold(),
            error,
            "Suggestion:".yellow(),
            "Choose another port with --port or PORT"
        ),
        ProxyError::Configuration { .. } => format!(
            "{} {}\n\n{}\n  {}",
            "Error:".red().bold(),
            error,
            "Suggestion:".yellow(),
            "Place openapi.json in the same directory as the executable"
        ),
        _ => format!("{} {}", "Error:".red().bold(), error),
    }
}

/// Print an error to stderr and return the process exit code.
#[must_use]
pub fn display_error(error: &ProxyError) -> i32 {
    tracing::debug!(error = ?error, "fatal error");
    eprintln!("{}", format_error(error));
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use openapi_mcp_openapi::{OpenApiError, ValidationError};

    #[test]
    fn test_validation_lists_each_message() {
        colored::control::set_override(false);
        let error = ProxyError::from(OpenApiError::from(ValidationError::new(vec![
            "/info/title: required string field is missing".into(),
            "/paths: required object is missing".into(),
        ])));

        assert_eq!(
            format_error(&error),
            "Invalid OpenAPI specification:\n\
             /info/title: required string field is missing\n\
             /paths: required object is missing"
        );
        assert_eq!(display_error(&error), 1);
    }

    #[test]
    fn test_configuration_error_has_suggestion() {
        colored::control::set_override(false);
        let formatted = format_error(&ProxyError::configuration("bad value"));
        assert!(formatted.contains("bad value"));
        assert!(formatted.contains("openapi.json"));
    }
}
