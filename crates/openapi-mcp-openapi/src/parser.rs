//! OpenAPI document loading.
//!
//! Loading is three steps: parse text into a JSON value, run the structural
//! checks in [`crate::validate`], then deserialize into the typed
//! [`openapiv3::OpenAPI`] model.

use std::path::Path;

use openapiv3::OpenAPI;
use serde_json::Value;

use crate::error::{OpenApiError, Result, ValidationError};
use crate::validate::{HTTP_METHODS, validate_document};

/// Parse JSON or YAML text into a JSON value.
///
/// Content starting with `{` is treated as JSON, anything else as YAML.
pub fn parse_document(content: &str) -> Result<Value> {
    if content.trim_start().starts_with('{') {
        return serde_json::from_str(content).map_err(Into::into);
    }
    serde_yaml::from_str(content).map_err(Into::into)
}

/// Parse, validate and deserialize an OpenAPI document.
///
/// # Errors
///
/// [`OpenApiError::Parse`] for unreadable text, [`OpenApiError::Validation`]
/// for a document that parses but is not a valid OpenAPI 3.x description.
pub fn parse_spec(content: &str) -> Result<OpenAPI> {
    let mut document = parse_document(content)?;
    validate_document(&document)?;
    default_missing_responses(&mut document);

    serde_json::from_value(document)
        .map_err(|e| ValidationError::new(vec![format!("/: {e}")]).into())
}

/// Load an OpenAPI document from a file with async I/O.
///
/// # Errors
///
/// [`OpenApiError::Io`] when the file cannot be read, otherwise as
/// [`parse_spec`].
pub async fn load_from_file(path: &Path) -> Result<OpenAPI> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| OpenApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_spec(&content)
}

/// OpenAPI 3.1 makes `responses` optional; the typed model does not.
fn default_missing_responses(document: &mut Value) {
    let Some(paths) = document.get_mut("paths").and_then(Value::as_object_mut) else {
        return;
    };
    for item in paths.values_mut().filter_map(Value::as_object_mut) {
        for method in HTTP_METHODS {
            if let Some(operation) = item.get_mut(*method).and_then(Value::as_object_mut) {
                operation
                    .entry("responses")
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_SPEC_JSON: &str = r#"{
        "openapi": "3.0.3",
        "info": { "title": "Test API", "version": "1.0.0" },
        "paths": {
            "/users": {
                "get": {
                    "summary": "List users",
                    "responses": { "200": { "description": "Success" } }
                }
            }
        }
    }"#;

    const SIMPLE_SPEC_YAML: &str = r#"
openapi: "3.1.0"
info:
  title: Test API
  version: "1.0.0"
paths:
  /users:
    get:
      summary: List users
"#;

    #[test]
    fn test_parse_json() {
        let spec = parse_spec(SIMPLE_SPEC_JSON).unwrap();
        assert_eq!(spec.info.title, "Test API");
        assert!(spec.paths.paths.contains_key("/users"));
    }

    #[test]
    fn test_parse_yaml_without_responses() {
        let spec = parse_spec(SIMPLE_SPEC_YAML).unwrap();
        assert_eq!(spec.openapi, "3.1.0");
        assert!(spec.paths.paths.contains_key("/users"));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let result = parse_spec("{ not json");
        assert!(matches!(result, Err(OpenApiError::Parse(_))));
    }

    #[test]
    fn test_structural_problem_is_validation_error() {
        let result = parse_spec(r#"{"openapi": "2.0", "info": {"title": "x", "version": "1"}, "paths": {}}"#);
        let Err(OpenApiError::Validation(err)) = result else {
            panic!("expected validation error");
        };
        assert_eq!(err.errors.len(), 1);
        assert!(err.errors[0].starts_with("/openapi"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = load_from_file(Path::new("/definitely/not/here/openapi.json")).await;
        assert!(matches!(result, Err(OpenApiError::Io { .. })));
    }
}
