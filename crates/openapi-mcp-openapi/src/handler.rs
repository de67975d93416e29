//! MCP handler that exposes OpenAPI operations as tools.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use openapi_mcp_core::context::RequestContext;
use openapi_mcp_core::error::{McpError, McpResult};
use openapi_mcp_core::handler::McpHandler;
use openapi_mcp_core::types::{ServerInfo, Tool, ToolInputSchema, ToolResult};
use serde_json::{Map, Value, json};

use crate::error::OpenApiError;
use crate::provider::{ExtractedOperation, OpenApiProvider};

/// MCP handler backed by an [`OpenApiProvider`].
#[derive(Clone)]
pub struct OpenApiHandler {
    provider: Arc<OpenApiProvider>,
}

impl fmt::Debug for OpenApiHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenApiHandler")
            .field("title", &self.provider.title())
            .field("version", &self.provider.version())
            .field("operations", &self.provider.operations().len())
            .finish()
    }
}

impl OpenApiHandler {
    /// Create a new handler from a provider.
    pub fn new(provider: Arc<OpenApiProvider>) -> Self {
        Self { provider }
    }

    fn build_input_schema(op: &ExtractedOperation) -> ToolInputSchema {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &op.parameters {
            let mut schema = param.schema.clone().unwrap_or_else(|| json!({"type": "string"}));
            if let Some(desc) = &param.description
                && let Value::Object(map) = &mut schema
            {
                map.insert("description".to_string(), json!(desc));
            }
            properties.insert(param.name.clone(), schema);
            if param.required {
                required.push(param.name.clone());
            }
        }

        if let Some(body_schema) = &op.request_body_schema {
            properties.insert("body".to_string(), body_schema.clone());
            if op.request_body_required {
                required.push("body".to_string());
            }
        }

        ToolInputSchema {
            schema_type: "object".to_string(),
            properties: Some(Value::Object(properties)),
            required: (!required.is_empty()).then_some(required),
        }
    }

    fn to_tool(op: &ExtractedOperation) -> Tool {
        let mut meta = HashMap::new();
        meta.insert("method".to_string(), json!(op.method));
        meta.insert("path".to_string(), json!(op.path));
        if let Some(id) = &op.operation_id {
            meta.insert("operationId".to_string(), json!(id));
        }

        Tool {
            name: op.tool_name.clone(),
            description: op
                .summary
                .clone()
                .or_else(|| op.description.clone())
                .or_else(|| Some(format!("{} {}", op.method, op.path))),
            input_schema: Self::build_input_schema(op),
            meta: Some(meta),
        }
    }

    async fn execute_operation(
        &self,
        op: &ExtractedOperation,
        args: HashMap<String, Value>,
    ) -> McpResult<ToolResult> {
        let request = self.provider.build_request(op, &args).map_err(|e| match e {
            OpenApiError::MissingParameter(_) => McpError::invalid_params(e.to_string()),
            other => McpError::tool_execution_failed(&op.tool_name, other.to_string()),
        })?;

        tracing::debug!(tool = %op.tool_name, method = %op.method, path = %op.path, "calling upstream API");

        let response = request
            .send()
            .await
            .map_err(|e| McpError::external_service(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| McpError::external_service(format!("Failed to read response: {e}")))?;

        let text = match serde_json::from_str::<Value>(&body) {
            Ok(json) => serde_json::to_string_pretty(&json).unwrap_or(body),
            Err(_) => body,
        };

        if status.is_success() {
            Ok(ToolResult::text(text))
        } else {
            tracing::debug!(tool = %op.tool_name, %status, "upstream API returned an error");
            Ok(ToolResult::error(format!("HTTP {status}: {text}")))
        }
    }
}

impl McpHandler for OpenApiHandler {
    fn server_info(&self) -> ServerInfo {
        ServerInfo::new(self.provider.title(), self.provider.version())
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.provider.operations().iter().map(Self::to_tool).collect()
    }

    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        args: Value,
        _ctx: &'a RequestContext,
    ) -> impl Future<Output = McpResult<ToolResult>> + Send + 'a {
        async move {
            let op = self
                .provider
                .operation(name)
                .ok_or_else(|| McpError::tool_not_found(name))?;

            let args: HashMap<String, Value> = match args {
                Value::Object(map) => map.into_iter().collect(),
                Value::Null => HashMap::new(),
                _ => return Err(McpError::invalid_params("Arguments must be an object or null")),
            };

            self.execute_operation(op, args).await
        }
    }
}
