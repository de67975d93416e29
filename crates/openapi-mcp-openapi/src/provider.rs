//! Operation extraction and HTTP execution for a loaded OpenAPI document.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use openapiv3::{
    OpenAPI, Operation, Parameter, ParameterSchemaOrContent, ReferenceOr, RequestBody, Schema,
};
use serde_json::{Value, json};
use url::Url;

use crate::error::{OpenApiError, Result};
use crate::handler::OpenApiHandler;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where a parameter is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    /// Substituted into the path template
    Path,
    /// Appended to the query string
    Query,
    /// Sent as a request header
    Header,
    /// Sent in the `Cookie` header
    Cookie,
}

/// An operation extracted from an OpenAPI spec.
#[derive(Debug, Clone)]
pub struct ExtractedOperation {
    /// MCP tool name
    pub tool_name: String,
    /// HTTP method, upper case
    pub method: String,
    /// Path template (e.g. `/users/{id}`)
    pub path: String,
    /// Operation ID (if specified)
    pub operation_id: Option<String>,
    /// Summary
    pub summary: Option<String>,
    /// Operation description
    pub description: Option<String>,
    /// Path-level and operation-level parameters, merged
    pub parameters: Vec<ExtractedParameter>,
    /// JSON request body schema, if the operation takes one
    pub request_body_schema: Option<Value>,
    /// Whether the body must be supplied
    pub request_body_required: bool,
}

/// A parameter extracted from an OpenAPI operation.
#[derive(Debug, Clone)]
pub struct ExtractedParameter {
    /// Parameter name
    pub name: String,
    /// Where the parameter goes
    pub location: ParameterLocation,
    /// Whether the parameter is required
    pub required: bool,
    /// Description
    pub description: Option<String>,
    /// JSON Schema for the parameter
    pub schema: Option<Value>,
}

/// Exposes the operations of one OpenAPI document and performs calls to them.
#[derive(Debug)]
pub struct OpenApiProvider {
    title: String,
    version: String,
    base_url: Option<Url>,
    client: reqwest::Client,
    operations: Vec<ExtractedOperation>,
}

impl OpenApiProvider {
    /// Create a provider from a parsed OpenAPI specification.
    ///
    /// The base URL defaults to the first absolute `servers[].url`, with
    /// server variables replaced by their defaults.
    pub fn from_spec(spec: &OpenAPI) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            title: spec.info.title.clone(),
            version: spec.info.version.clone(),
            base_url: default_base_url(spec),
            client,
            operations: extract_operations(spec),
        }
    }

    /// Override the base URL for API calls.
    ///
    /// # Errors
    ///
    /// Fails if `base_url` is not an absolute URL that can carry a path.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)?;
        if url.cannot_be_a_base() {
            return Err(OpenApiError::InvalidBaseUrl(base_url.to_string()));
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// API title from the spec.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// API version from the spec.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The base URL calls are sent to, if one is known.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// All extracted operations, in document order.
    pub fn operations(&self) -> &[ExtractedOperation] {
        &self.operations
    }

    /// Find an operation by its tool name.
    pub fn operation(&self, tool_name: &str) -> Option<&ExtractedOperation> {
        self.operations.iter().find(|op| op.tool_name == tool_name)
    }

    /// Convert this provider into an MCP handler.
    pub fn into_handler(self) -> OpenApiHandler {
        OpenApiHandler::new(Arc::new(self))
    }

    /// Build the full URL for an operation.
    pub(crate) fn build_url(
        &self,
        operation: &ExtractedOperation,
        args: &HashMap<String, Value>,
    ) -> Result<Url> {
        let mut url = self.base_url.clone().ok_or(OpenApiError::NoBaseUrl)?;

        let mut segments = Vec::new();
        for segment in operation.path.split('/').filter(|s| !s.is_empty()) {
            segments.push(substitute_segment(segment, operation, args)?);
        }
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| OpenApiError::InvalidBaseUrl(operation.path.clone()))?;
            path.pop_if_empty();
            path.extend(segments.iter());
        }

        let mut query = Vec::new();
        for param in operation
            .parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Query)
        {
            match args.get(&param.name) {
                Some(Value::Null) | None if param.required => {
                    return Err(OpenApiError::MissingParameter(param.name.clone()));
                }
                Some(Value::Null) | None => {}
                Some(Value::Array(values)) => {
                    query.extend(values.iter().map(|v| (param.name.as_str(), value_to_string(v))));
                }
                Some(value) => query.push((param.name.as_str(), value_to_string(value))),
            }
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, &value);
            }
        }

        Ok(url)
    }

    /// Build the HTTP request for an operation.
    pub(crate) fn build_request(
        &self,
        operation: &ExtractedOperation,
        args: &HashMap<String, Value>,
    ) -> Result<reqwest::RequestBuilder> {
        let url = self.build_url(operation, args)?;
        let method = reqwest::Method::from_bytes(operation.method.as_bytes())
            .map_err(|_| OpenApiError::Parse(format!("unsupported method {}", operation.method)))?;
        let mut request = self.client.request(method, url);

        let mut cookies = Vec::new();
        for param in &operation.parameters {
            let value = args.get(&param.name).filter(|v| !v.is_null());
            match (param.location, value) {
                (ParameterLocation::Header, Some(value)) => {
                    request = request.header(param.name.as_str(), value_to_string(value));
                }
                (ParameterLocation::Cookie, Some(value)) => {
                    cookies.push(format!("{}={}", param.name, value_to_string(value)));
                }
                (ParameterLocation::Header | ParameterLocation::Cookie, None) if param.required => {
                    return Err(OpenApiError::MissingParameter(param.name.clone()));
                }
                _ => {}
            }
        }
        if !cookies.is_empty() {
            request = request.header(reqwest::header::COOKIE, cookies.join("; "));
        }

        match args.get("body").filter(|v| !v.is_null()) {
            Some(body) if operation.request_body_schema.is_some() => {
                request = request.json(body);
            }
            None if operation.request_body_required => {
                return Err(OpenApiError::MissingParameter("body".to_string()));
            }
            _ => {}
        }

        Ok(request)
    }
}

fn default_base_url(spec: &OpenAPI) -> Option<Url> {
    spec.servers.iter().find_map(|server| {
        let mut url = server.url.clone();
        if let Some(variables) = &server.variables {
            for (name, variable) in variables {
                url = url.replace(&format!("{{{name}}}"), &variable.default);
            }
        }
        Url::parse(&url).ok().filter(|u| !u.cannot_be_a_base())
    })
}

fn substitute_segment(
    segment: &str,
    operation: &ExtractedOperation,
    args: &HashMap<String, Value>,
) -> Result<String> {
    let mut out = segment.to_string();
    for param in operation
        .parameters
        .iter()
        .filter(|p| p.location == ParameterLocation::Path)
    {
        let placeholder = format!("{{{}}}", param.name);
        if !out.contains(&placeholder) {
            continue;
        }
        let value = args
            .get(&param.name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| OpenApiError::MissingParameter(param.name.clone()))?;
        out = out.replace(&placeholder, &value_to_string(value));
    }
    Ok(out)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Tool name for an operation: its `operationId`, or `<method>_<path>` with
/// everything outside `[A-Za-z0-9_-]` replaced.
pub(crate) fn tool_name(method: &str, path: &str, operation_id: Option<&str>) -> String {
    if let Some(id) = operation_id {
        return id.to_string();
    }
    let path_part: String = path
        .trim_start_matches('/')
        .replace(['{', '}'], "")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}", method.to_lowercase(), path_part)
}

fn extract_operations(spec: &OpenAPI) -> Vec<ExtractedOperation> {
    let mut operations = Vec::new();

    for (path, item) in &spec.paths.paths {
        let ReferenceOr::Item(item) = item else {
            tracing::debug!(path = %path, "skipping referenced path item");
            continue;
        };

        for (method, operation) in item.iter() {
            operations.push(extract_operation(spec, method, path, &item.parameters, operation));
        }
    }

    operations
}

fn extract_operation(
    spec: &OpenAPI,
    method: &str,
    path: &str,
    shared: &[ReferenceOr<Parameter>],
    operation: &Operation,
) -> ExtractedOperation {
    let mut parameters: Vec<ExtractedParameter> = Vec::new();
    for param in shared.iter().chain(&operation.parameters) {
        let Some(param) = resolve_parameter(spec, param) else {
            continue;
        };
        let extracted = extract_parameter(spec, param);
        // Operation-level definitions override path-level ones.
        parameters.retain(|p| !(p.name == extracted.name && p.location == extracted.location));
        parameters.push(extracted);
    }

    let body = operation
        .request_body
        .as_ref()
        .and_then(|body| resolve_request_body(spec, body));
    let request_body_schema = body.and_then(|body| json_body_schema(spec, body));

    ExtractedOperation {
        tool_name: tool_name(method, path, operation.operation_id.as_deref()),
        method: method.to_uppercase(),
        path: path.to_string(),
        operation_id: operation.operation_id.clone(),
        summary: operation.summary.clone(),
        description: operation.description.clone(),
        parameters,
        request_body_required: request_body_schema.is_some() && body.is_some_and(|b| b.required),
        request_body_schema,
    }
}

fn resolve_parameter<'a>(spec: &'a OpenAPI, param: &'a ReferenceOr<Parameter>) -> Option<&'a Parameter> {
    match param {
        ReferenceOr::Item(param) => Some(param),
        ReferenceOr::Reference { reference } => {
            let name = reference.strip_prefix("#/components/parameters/")?;
            spec.components
                .as_ref()?
                .parameters
                .get(name)?
                .as_item()
        }
    }
}

fn resolve_request_body<'a>(
    spec: &'a OpenAPI,
    body: &'a ReferenceOr<RequestBody>,
) -> Option<&'a RequestBody> {
    match body {
        ReferenceOr::Item(body) => Some(body),
        ReferenceOr::Reference { reference } => {
            let name = reference.strip_prefix("#/components/requestBodies/")?;
            spec.components
                .as_ref()?
                .request_bodies
                .get(name)?
                .as_item()
        }
    }
}

fn json_body_schema(spec: &OpenAPI, body: &RequestBody) -> Option<Value> {
    body.content
        .iter()
        .find(|(mime, _)| {
            let mime = mime.split(';').next().unwrap_or_default().trim();
            mime == "application/json" || mime.ends_with("+json")
        })
        .map(|(_, media)| {
            media
                .schema
                .as_ref()
                .and_then(|schema| schema_to_json(spec, schema))
                .unwrap_or_else(|| json!({"type": "object"}))
        })
}

fn extract_parameter(spec: &OpenAPI, param: &Parameter) -> ExtractedParameter {
    let location = match param {
        Parameter::Query { .. } => ParameterLocation::Query,
        Parameter::Header { .. } => ParameterLocation::Header,
        Parameter::Path { .. } => ParameterLocation::Path,
        Parameter::Cookie { .. } => ParameterLocation::Cookie,
    };
    let data = param.parameter_data_ref();

    ExtractedParameter {
        name: data.name.clone(),
        location,
        required: data.required || location == ParameterLocation::Path,
        description: data.description.clone(),
        schema: match &data.format {
            ParameterSchemaOrContent::Schema(schema) => schema_to_json(spec, schema),
            ParameterSchemaOrContent::Content(_) => None,
        },
    }
}

/// Top-level `#/components/schemas/` references are inlined; nested ones are
/// left as `$ref`.
fn schema_to_json(spec: &OpenAPI, schema: &ReferenceOr<Schema>) -> Option<Value> {
    match schema {
        ReferenceOr::Item(s) => serde_json::to_value(s).ok(),
        ReferenceOr::Reference { reference } => {
            let resolved = reference
                .strip_prefix("#/components/schemas/")
                .and_then(|name| spec.components.as_ref()?.schemas.get(name))
                .and_then(ReferenceOr::as_item)
                .and_then(|s| serde_json::to_value(s).ok());
            Some(resolved.unwrap_or_else(|| json!({ "$ref": reference })))
        }
    }
}
