//! Structural validation of OpenAPI 3.x documents.
//!
//! Checks run on the raw JSON value so every problem in the document is
//! reported at once, in document order, each prefixed with a JSON pointer.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::error::ValidationError;

/// Operation keys of a path item.
pub(crate) const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

const PARAMETER_LOCATIONS: &[&str] = &["query", "header", "path", "cookie"];

/// Validate the structure of an OpenAPI 3.x document.
///
/// # Errors
///
/// Returns every problem found, in order, as a [`ValidationError`].
pub fn validate_document(document: &Value) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    let Some(root) = document.as_object() else {
        return Err(ValidationError::new(vec![
            "/: document must be a JSON object".to_string(),
        ]));
    };

    let version = match root.get("openapi") {
        None => {
            errors.push("/openapi: required string field is missing".to_string());
            None
        }
        Some(Value::String(v)) if v.starts_with("3.") => Some(v.as_str()),
        Some(Value::String(v)) => {
            errors.push(format!("/openapi: unsupported version '{v}', expected 3.x"));
            None
        }
        Some(_) => {
            errors.push("/openapi: must be a string".to_string());
            None
        }
    };
    let responses_required = version.is_some_and(|v| v.starts_with("3.0"));

    match root.get("info") {
        Some(Value::Object(info)) => {
            for field in ["title", "version"] {
                if !info.get(field).is_some_and(Value::is_string) {
                    errors.push(format!("/info/{field}: required string field is missing"));
                }
            }
        }
        Some(_) => errors.push("/info: must be an object".to_string()),
        None => errors.push("/info: required object is missing".to_string()),
    }

    match root.get("paths") {
        Some(Value::Object(paths)) => {
            let mut operation_ids: HashMap<&str, String> = HashMap::new();
            for (path, item) in paths {
                validate_path_item(
                    document,
                    path,
                    item,
                    responses_required,
                    &mut operation_ids,
                    &mut errors,
                );
            }
        }
        Some(_) => errors.push("/paths: must be an object".to_string()),
        None => errors.push("/paths: required object is missing".to_string()),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(errors))
    }
}

fn validate_path_item<'a>(
    document: &'a Value,
    path: &str,
    item: &'a Value,
    responses_required: bool,
    operation_ids: &mut HashMap<&'a str, String>,
    errors: &mut Vec<String>,
) {
    let pointer = format!("/paths/{}", escape_pointer(path));

    if !path.starts_with('/') {
        errors.push(format!("{pointer}: path must start with '/'"));
    }

    let Some(item) = item.as_object() else {
        errors.push(format!("{pointer}: path item must be an object"));
        return;
    };
    if item.contains_key("$ref") {
        return;
    }

    let shared = item.get("parameters");
    let mut shared_path_params = BTreeSet::new();
    validate_parameters(document, &pointer, shared, &mut shared_path_params, errors);

    let templated = template_names(path);

    for method in HTTP_METHODS {
        let Some(operation) = item.get(*method) else {
            continue;
        };
        let op_pointer = format!("{pointer}/{method}");
        let Some(operation) = operation.as_object() else {
            errors.push(format!("{op_pointer}: operation must be an object"));
            continue;
        };

        if responses_required && !operation.get("responses").is_some_and(Value::is_object) {
            errors.push(format!("{op_pointer}/responses: required object is missing"));
        }

        let mut path_params = shared_path_params.clone();
        validate_parameters(
            document,
            &op_pointer,
            operation.get("parameters"),
            &mut path_params,
            errors,
        );

        for name in &templated {
            if !path_params.contains(name.as_str()) {
                errors.push(format!(
                    "{op_pointer}: path parameter '{name}' is not declared"
                ));
            }
        }

        if let Some(id) = operation.get("operationId").and_then(Value::as_str) {
            let id_pointer = format!("{op_pointer}/operationId");
            if let Some(first) = operation_ids.get(id) {
                errors.push(format!(
                    "{id_pointer}: duplicate operationId '{id}' (first used at {first})"
                ));
            } else {
                operation_ids.insert(id, id_pointer);
            }
        }
    }
}

fn validate_parameters(
    document: &Value,
    pointer: &str,
    parameters: Option<&Value>,
    path_params: &mut BTreeSet<String>,
    errors: &mut Vec<String>,
) {
    let Some(parameters) = parameters else {
        return;
    };
    let Some(parameters) = parameters.as_array() else {
        errors.push(format!("{pointer}/parameters: must be an array"));
        return;
    };

    for (index, parameter) in parameters.iter().enumerate() {
        let param_pointer = format!("{pointer}/parameters/{index}");

        let parameter = match parameter.get("$ref").and_then(Value::as_str) {
            Some(reference) => match resolve_local_ref(document, reference) {
                Some(target) => target,
                None => {
                    errors.push(format!(
                        "{param_pointer}/$ref: cannot resolve '{reference}'"
                    ));
                    continue;
                }
            },
            None => parameter,
        };

        let Some(parameter) = parameter.as_object() else {
            errors.push(format!("{param_pointer}: parameter must be an object"));
            continue;
        };

        let name = parameter.get("name").and_then(Value::as_str);
        if name.is_none() {
            errors.push(format!("{param_pointer}/name: required string field is missing"));
        }

        let location = parameter.get("in").and_then(Value::as_str);
        match location {
            Some(l) if PARAMETER_LOCATIONS.contains(&l) => {}
            Some(l) => errors.push(format!(
                "{param_pointer}/in: invalid location '{l}', expected one of query, header, path, cookie"
            )),
            None => errors.push(format!("{param_pointer}/in: required string field is missing")),
        }

        if location == Some("path") {
            if parameter.get("required") != Some(&Value::Bool(true)) {
                errors.push(format!(
                    "{param_pointer}/required: path parameters must be required"
                ));
            }
            if let Some(name) = name {
                path_params.insert(name.to_string());
            }
        }
    }
}

/// Resolve a `#/...` reference inside the same document.
pub(crate) fn resolve_local_ref<'a>(document: &'a Value, reference: &str) -> Option<&'a Value> {
    reference
        .strip_prefix('#')
        .and_then(|pointer| document.pointer(pointer))
}

/// Names of `{template}` segments in a path.
fn template_names(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &rest[start + len + 1..];
    }
    names
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
