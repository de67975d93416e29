//! SSE routes driven in-process with `tower::ServiceExt::oneshot`.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use openapi_mcp_core::{McpError, McpHandler, McpResult, RequestContext, ServerInfo, Tool, ToolResult};
use openapi_mcp_proxy::{ProxyError, ProxyFactory, ProxyResult, SessionRegistry, router, run_streaming};
use openapi_mcp_server::McpServer;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::Notify;
use tower::ServiceExt;

#[derive(Clone)]
struct WhoAmI;

impl McpHandler for WhoAmI {
    fn server_info(&self) -> ServerInfo {
        ServerInfo::new("whoami", "0.1.0")
    }

    fn list_tools(&self) -> Vec<Tool> {
        vec![Tool::new("whoami", "Report the session")]
    }

    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        _args: Value,
        ctx: &'a RequestContext,
    ) -> impl Future<Output = McpResult<ToolResult>> + Send + 'a {
        async move {
            match name {
                "whoami" => Ok(ToolResult::text(ctx.session_id.clone().unwrap_or_default())),
                _ => Err(McpError::tool_not_found(name)),
            }
        }
    }
}

#[derive(Default)]
struct CountingFactory {
    builds: AtomicUsize,
}

impl ProxyFactory for CountingFactory {
    type Handler = WhoAmI;

    fn build(&self) -> impl Future<Output = ProxyResult<McpServer<WhoAmI>>> + Send + '_ {
        async move {
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(McpServer::new(WhoAmI))
        }
    }
}

struct FailingFactory;

impl ProxyFactory for FailingFactory {
    type Handler = WhoAmI;

    fn build(&self) -> impl Future<Output = ProxyResult<McpServer<WhoAmI>>> + Send + '_ {
        async move { Err(ProxyError::configuration("spec unavailable")) }
    }
}

/// Holds every build until released.
#[derive(Default)]
struct GatedFactory {
    entered: Notify,
    release: Notify,
}

impl ProxyFactory for GatedFactory {
    type Handler = WhoAmI;

    fn build(&self) -> impl Future<Output = ProxyResult<McpServer<WhoAmI>>> + Send + '_ {
        async move {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(McpServer::new(WhoAmI))
        }
    }
}

/// Incremental reader of `text/event-stream` bodies.
struct EventReader {
    body: Body,
    buf: String,
}

impl EventReader {
    fn new(body: Body) -> Self {
        Self {
            body,
            buf: String::new(),
        }
    }

    /// Next `(event, data)` pair, skipping comments.
    async fn next(&mut self) -> (String, String) {
        loop {
            while let Some(end) = self.buf.find("\n\n") {
                let raw: String = self.buf.drain(..end + 2).collect();
                let mut event = "message".to_string();
                let mut data = String::new();
                for line in raw.lines() {
                    if let Some(value) = line.strip_prefix("event:") {
                        event = value.trim_start().to_string();
                    } else if let Some(value) = line.strip_prefix("data:") {
                        data.push_str(value.strip_prefix(' ').unwrap_or(value));
                    }
                }
                if !data.is_empty() {
                    return (event, data);
                }
            }

            let frame = tokio::time::timeout(Duration::from_secs(5), self.body.frame())
                .await
                .expect("event within timeout")
                .expect("stream still open")
                .unwrap();
            if let Ok(bytes) = frame.into_data() {
                self.buf.push_str(std::str::from_utf8(&bytes).unwrap());
            }
        }
    }

    async fn next_message(&mut self) -> Value {
        let (event, data) = self.next().await;
        assert_eq!(event, "message");
        serde_json::from_str(&data).unwrap()
    }
}

async fn open_stream(app: &Router) -> (String, EventReader) {
    let response = app
        .clone()
        .oneshot(Request::get("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let mut reader = EventReader::new(response.into_body());
    let (event, endpoint) = reader.next().await;
    assert_eq!(event, "endpoint");
    let session_id = endpoint
        .strip_prefix("/events?sessionId=")
        .expect("endpoint carries the session id")
        .to_string();
    (session_id, reader)
}

async fn post(app: &Router, session_id: &str, body: impl Into<Body>) -> StatusCode {
    app.clone()
        .oneshot(
            Request::post(format!("/events?sessionId={session_id}"))
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

fn whoami_call(id: u64) -> String {
    json!({
        "jsonrpc": "2.0", "id": id, "method": "tools/call",
        "params": {"name": "whoami", "arguments": {}}
    })
    .to_string()
}

#[tokio::test]
async fn test_open_stream_then_post() {
    let registry = SessionRegistry::new();
    let app = router(Arc::new(CountingFactory::default()), registry.clone());

    let (session_id, mut events) = open_stream(&app).await;
    assert!(registry.get(&session_id).is_some());

    let init = json!({
        "jsonrpc": "2.0", "id": 1, "method": "initialize",
        "params": {"protocolVersion": "2025-06-18", "clientInfo": {"name": "t", "version": "1"}}
    });
    assert_eq!(post(&app, &session_id, init.to_string()).await, StatusCode::ACCEPTED);

    let response = events.next_message().await;
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["serverInfo"]["name"], "whoami");

    assert_eq!(post(&app, &session_id, whoami_call(2)).await, StatusCode::ACCEPTED);
    let response = events.next_message().await;
    assert_eq!(response["result"]["content"][0]["text"], session_id.as_str());
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = router(Arc::new(CountingFactory::default()), SessionRegistry::new());

    assert_eq!(post(&app, "bogus", whoami_call(1)).await, StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(Request::post("/events").body(Body::from(whoami_call(1))).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_400_and_session_survives() {
    let app = router(Arc::new(CountingFactory::default()), SessionRegistry::new());
    let (session_id, mut events) = open_stream(&app).await;

    assert_eq!(post(&app, &session_id, "{not json").await, StatusCode::BAD_REQUEST);

    assert_eq!(post(&app, &session_id, whoami_call(7)).await, StatusCode::ACCEPTED);
    let response = events.next_message().await;
    assert_eq!(response["id"], 7);
}

#[tokio::test]
async fn test_closed_stream_is_deregistered() {
    let registry = SessionRegistry::new();
    let app = router(Arc::new(CountingFactory::default()), registry.clone());

    let (session_id, events) = open_stream(&app).await;
    assert_eq!(registry.len(), 1);

    drop(events);
    assert!(registry.get(&session_id).is_none());
    assert_eq!(post(&app, &session_id, whoami_call(1)).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let factory = Arc::new(CountingFactory::default());
    let app = router(Arc::clone(&factory), SessionRegistry::new());

    let (id_a, mut events_a) = open_stream(&app).await;
    let (id_b, mut events_b) = open_stream(&app).await;
    assert_ne!(id_a, id_b);
    assert_eq!(factory.builds.load(Ordering::SeqCst), 2);

    assert_eq!(post(&app, &id_a, whoami_call(1)).await, StatusCode::ACCEPTED);
    let response = events_a.next_message().await;
    assert_eq!(response["result"]["content"][0]["text"], id_a.as_str());

    let nothing = tokio::time::timeout(Duration::from_millis(100), events_b.next()).await;
    assert!(nothing.is_err(), "session B must not see A's response");

    assert_eq!(post(&app, &id_b, whoami_call(2)).await, StatusCode::ACCEPTED);
    let response = events_b.next_message().await;
    assert_eq!(response["result"]["content"][0]["text"], id_b.as_str());
}

#[tokio::test]
async fn test_factory_failure_is_500_and_not_registered() {
    let registry = SessionRegistry::new();
    let app = router(Arc::new(FailingFactory), registry.clone());

    let response = app
        .clone()
        .oneshot(Request::get("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_session_closed_during_build_is_500() {
    let registry = SessionRegistry::new();
    let factory = Arc::new(GatedFactory::default());
    let app = router(Arc::clone(&factory), registry.clone());

    let pending = tokio::spawn(
        app.clone()
            .oneshot(Request::get("/events").body(Body::empty()).unwrap()),
    );

    tokio::time::timeout(Duration::from_secs(5), factory.entered.notified())
        .await
        .expect("build started");
    assert_eq!(registry.len(), 1);

    registry.close_all();
    assert!(registry.is_empty());

    factory.release.notify_one();
    let response = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("handler finishes")
        .unwrap()
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_bind_conflict_is_reported() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    let result = run_streaming(CountingFactory::default(), &addr, std::future::pending()).await;
    assert!(matches!(result, Err(ProxyError::Bind { .. })));
}

#[tokio::test]
async fn test_graceful_shutdown_returns() {
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_streaming(CountingFactory::default(), "127.0.0.1:0", async {}),
    )
    .await
    .expect("listener stops after shutdown");
    assert!(result.is_ok());
}
