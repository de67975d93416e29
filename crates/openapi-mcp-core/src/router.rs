//! MCP request router.
//!
//! Maps a parsed JSON-RPC message onto [`McpHandler`] methods. Every transport
//! funnels messages through [`route_request`], so the protocol surface is the
//! same over stdio and over a streaming session.

use serde_json::{Map, Value, json};

use crate::{PROTOCOL_VERSION, SUPPORTED_VERSIONS};
use crate::context::RequestContext;
use crate::error::McpError;
use crate::handler::McpHandler;
use crate::jsonrpc::{JsonRpcIncoming, JsonRpcOutgoing};

/// Route a JSON-RPC message to the appropriate handler method.
///
/// Supported methods: `initialize`, `notifications/initialized` (and the
/// legacy `initialized`), `ping`, `tools/list` and `tools/call`. Anything else
/// is answered with a method-not-found error.
///
/// Notifications produce [`JsonRpcOutgoing::notification_ack`], which callers
/// drop instead of writing.
pub async fn route_request<H: McpHandler>(
    handler: &H,
    request: JsonRpcIncoming,
    ctx: &RequestContext,
) -> JsonRpcOutgoing {
    let id = request.id.clone();

    match request.method.as_str() {
        "initialize" => {
            let params = request.params.unwrap_or_default();
            let Some(client_info) = params.get("clientInfo") else {
                return JsonRpcOutgoing::error(
                    id,
                    McpError::invalid_params("Missing required field: clientInfo"),
                );
            };

            let has_name = client_info.get("name").and_then(Value::as_str).is_some();
            let has_version = client_info.get("version").and_then(Value::as_str).is_some();
            if !has_name || !has_version {
                return JsonRpcOutgoing::error(
                    id,
                    McpError::invalid_params("clientInfo must contain 'name' and 'version' fields"),
                );
            }

            // Echo a supported client version; otherwise advertise ours.
            let protocol_version = params
                .get("protocolVersion")
                .and_then(Value::as_str)
                .filter(|version| SUPPORTED_VERSIONS.contains(version))
                .unwrap_or(PROTOCOL_VERSION);
            JsonRpcOutgoing::success(id, build_initialize_result(handler, protocol_version))
        }

        "initialized" | "notifications/initialized" => {
            if id.is_some() {
                JsonRpcOutgoing::success(id, json!({}))
            } else {
                JsonRpcOutgoing::notification_ack()
            }
        }

        "ping" => JsonRpcOutgoing::success(id, json!({})),

        "tools/list" => JsonRpcOutgoing::success(id, json!({ "tools": handler.list_tools() })),

        "tools/call" => {
            let params = request.params.unwrap_or_default();
            let Some(name) = params.get("name").and_then(Value::as_str) else {
                return JsonRpcOutgoing::error(
                    id,
                    McpError::invalid_params("Missing required field: name"),
                );
            };
            let args = params.get("arguments").cloned().unwrap_or_default();

            match handler.call_tool(name, args, ctx).await {
                Ok(result) => match serde_json::to_value(&result) {
                    Ok(value) => JsonRpcOutgoing::success(id, value),
                    Err(e) => JsonRpcOutgoing::error(id, McpError::internal(e.to_string())),
                },
                Err(err) => JsonRpcOutgoing::error(id, err),
            }
        }

        _ if id.is_none() => {
            tracing::debug!(method = %request.method, "ignoring unknown notification");
            JsonRpcOutgoing::notification_ack()
        }

        _ => JsonRpcOutgoing::error(id, McpError::method_not_found(&request.method)),
    }
}

fn build_initialize_result<H: McpHandler>(handler: &H, protocol_version: &str) -> Value {
    let info = handler.server_info();

    let mut capabilities = Map::new();
    capabilities.insert("tools".into(), json!({ "listChanged": false }));

    let mut server_info = Map::new();
    server_info.insert("name".into(), json!(info.name));
    server_info.insert("version".into(), json!(info.version));

    json!({
        "protocolVersion": protocol_version,
        "capabilities": capabilities,
        "serverInfo": server_info,
    })
}

/// Parse a JSON string into a JSON-RPC incoming message.
pub fn parse_request(input: &str) -> Result<JsonRpcIncoming, McpError> {
    JsonRpcIncoming::parse(input).map_err(|e| McpError::parse_error(e.to_string()))
}

/// Serialize a JSON-RPC outgoing response to a string.
pub fn serialize_response(response: &JsonRpcOutgoing) -> Result<String, McpError> {
    response
        .to_json()
        .map_err(|e| McpError::internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::McpResult;
    use crate::types::{ServerInfo, Tool, ToolResult};
    use pretty_assertions::assert_eq;
    use std::future::Future;

    #[derive(Clone)]
    struct TestHandler;

    impl McpHandler for TestHandler {
        fn server_info(&self) -> ServerInfo {
            ServerInfo::new("test-server", "1.0.0")
        }

        fn list_tools(&self) -> Vec<Tool> {
            vec![Tool::new("greet", "Say hello")]
        }

        fn call_tool<'a>(
            &'a self,
            name: &'a str,
            args: Value,
            _ctx: &'a RequestContext,
        ) -> impl Future<Output = McpResult<ToolResult>> + Send + 'a {
            async move {
                match name {
                    "greet" => {
                        let who = args.get("name").and_then(Value::as_str).unwrap_or("world");
                        Ok(ToolResult::text(format!("Hello, {who}!")))
                    }
                    _ => Err(McpError::tool_not_found(name)),
                }
            }
        }
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcIncoming {
        JsonRpcIncoming::request(json!(1), method, params)
    }

    #[tokio::test]
    async fn test_route_initialize() {
        let req = request(
            "initialize",
            Some(json!({
                "protocolVersion": "2025-06-18",
                "clientInfo": {"name": "inspector", "version": "0.1.0"}
            })),
        );
        let resp = route_request(&TestHandler, req, &RequestContext::stdio()).await;
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-06-18");
        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_route_initialize_defaults_protocol_version() {
        let req = request(
            "initialize",
            Some(json!({"clientInfo": {"name": "c", "version": "1"}})),
        );
        let resp = route_request(&TestHandler, req, &RequestContext::stdio()).await;
        assert_eq!(resp.result.unwrap()["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_route_initialize_negotiates_protocol_version() {
        let req = request(
            "initialize",
            Some(json!({"protocolVersion": "2024-11-05", "clientInfo": {"name": "c", "version": "1"}})),
        );
        let resp = route_request(&TestHandler, req, &RequestContext::stdio()).await;
        assert_eq!(resp.result.unwrap()["protocolVersion"], "2024-11-05");

        let req = request(
            "initialize",
            Some(json!({"protocolVersion": "1999-01-01", "clientInfo": {"name": "c", "version": "1"}})),
        );
        let resp = route_request(&TestHandler, req, &RequestContext::stdio()).await;
        assert_eq!(resp.result.unwrap()["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_route_initialize_missing_client_info() {
        let req = request("initialize", Some(json!({"protocolVersion": "2025-06-18"})));
        let resp = route_request(&TestHandler, req, &RequestContext::stdio()).await;
        assert_eq!(resp.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_route_tools_list() {
        let resp = route_request(&TestHandler, request("tools/list", None), &RequestContext::stdio()).await;
        let result = resp.result.unwrap();
        assert_eq!(result["tools"][0]["name"], "greet");
    }

    #[tokio::test]
    async fn test_route_tools_call() {
        let req = request(
            "tools/call",
            Some(json!({"name": "greet", "arguments": {"name": "Ada"}})),
        );
        let resp = route_request(&TestHandler, req, &RequestContext::sse("abc")).await;
        assert_eq!(resp.result.unwrap()["content"][0]["text"], "Hello, Ada!");
    }

    #[tokio::test]
    async fn test_route_tools_call_unknown_tool() {
        let req = request("tools/call", Some(json!({"name": "missing"})));
        let resp = route_request(&TestHandler, req, &RequestContext::stdio()).await;
        assert_eq!(resp.error.unwrap().code, -32001);
    }

    #[tokio::test]
    async fn test_route_tools_call_missing_name() {
        let req = request("tools/call", Some(json!({})));
        let resp = route_request(&TestHandler, req, &RequestContext::stdio()).await;
        assert_eq!(resp.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_route_ping() {
        let resp = route_request(&TestHandler, request("ping", None), &RequestContext::stdio()).await;
        assert_eq!(resp.result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_route_notification() {
        let req = JsonRpcIncoming::parse(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .unwrap();
        let resp = route_request(&TestHandler, req, &RequestContext::stdio()).await;
        assert!(!resp.should_send());
    }

    #[tokio::test]
    async fn test_route_unknown_method() {
        let resp = route_request(&TestHandler, request("resources/list", None), &RequestContext::stdio()).await;
        let error = resp.error.unwrap();
        assert_eq!(error.code, -32601);
        assert!(error.message.contains("resources/list"));
    }

    #[test]
    fn test_parse_request_error_kind() {
        let err = parse_request("{not json").unwrap_err();
        assert_eq!(err.jsonrpc_code(), -32700);
    }
}
