//! SSE mode: one protocol-server instance per event stream.
//!
//! - `GET /events` opens a stream. The first event is `endpoint`, whose data
//!   is the URL to `POST` messages to. Responses follow as `message` events.
//! - `POST /events?sessionId=<id>` delivers one JSON-RPC message to the
//!   session's server.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use openapi_mcp_server::{MAX_MESSAGE_SIZE, SseChannel, SseEventStream, TransportError};
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::error::{ProxyError, ProxyResult};
use crate::factory::ProxyFactory;
use crate::registry::SessionRegistry;

/// Path of both the stream and the message endpoint.
pub const EVENTS_PATH: &str = "/events";

/// SSE keep-alive interval.
const SSE_KEEP_ALIVE_SECS: u64 = 30;

/// Shared state of the SSE routes.
struct StreamingState<F> {
    factory: Arc<F>,
    registry: SessionRegistry,
}

impl<F> Clone for StreamingState<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            registry: self.registry.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Build the SSE routes.
///
/// `registry` is owned by this router; several routers may run side by side.
pub fn router<F: ProxyFactory>(factory: Arc<F>, registry: SessionRegistry) -> Router {
    let state = StreamingState { factory, registry };

    Router::new()
        .route(EVENTS_PATH, get(open_stream::<F>).post(submit_message::<F>))
        .layer(DefaultBodyLimit::max(MAX_MESSAGE_SIZE))
        .with_state(state)
}

/// Bind `addr` and serve SSE sessions until `shutdown` resolves.
///
/// On shutdown every live session is closed so open streams end and the
/// listener can drain.
///
/// # Errors
///
/// [`ProxyError::Bind`] if the address cannot be bound, [`ProxyError::Serve`]
/// if the listener fails.
pub async fn run_streaming<F, S>(factory: F, addr: &str, shutdown: S) -> ProxyResult<()>
where
    F: ProxyFactory,
    S: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ProxyError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    let registry = SessionRegistry::new();
    let app = router(Arc::new(factory), registry.clone());

    tracing::info!("SSE server listening at http://{}{}", local_addr, EVENTS_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!(sessions = registry.len(), "shutting down, closing SSE sessions");
            registry.close_all();
        })
        .await
        .map_err(|source| ProxyError::Serve {
            addr: local_addr,
            source,
        })
}

/// Axum handler for `GET /events`.
async fn open_stream<F: ProxyFactory>(State(state): State<StreamingState<F>>) -> Response {
    let (channel, stream) = SseChannel::new(EVENTS_PATH);
    establish_session(&state, channel, stream).await
}

async fn establish_session<F: ProxyFactory>(
    state: &StreamingState<F>,
    channel: SseChannel,
    stream: SseEventStream,
) -> Response {
    let session_id = channel.session_id().to_string();

    // Registered before the first await so an early POST finds the session.
    if !state.registry.register(&channel) {
        tracing::error!(%session_id, "session id already registered");
        channel.close();
        return (StatusCode::INTERNAL_SERVER_ERROR, "SSE connection error").into_response();
    }

    match connect_session(state, &channel).await {
        Ok(()) => {
            tracing::info!(%session_id, "SSE session connected");
            Sse::new(stream)
                .keep_alive(KeepAlive::new().interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS)))
                .into_response()
        }
        Err(e) => {
            tracing::error!(%session_id, error = ?e, "failed to establish SSE session");
            channel.close();
            (StatusCode::INTERNAL_SERVER_ERROR, "SSE connection error").into_response()
        }
    }
}

async fn connect_session<F: ProxyFactory>(
    state: &StreamingState<F>,
    channel: &SseChannel,
) -> ProxyResult<()> {
    let server = state.factory.build().await?;
    let running = server.connect(channel.transport()).await?;

    let session_id = channel.session_id().to_string();
    tokio::spawn(async move {
        match running.waiting().await {
            Ok(()) => tracing::info!(%session_id, "SSE session closed"),
            Err(e) => tracing::warn!(%session_id, error = %e, "SSE session ended with error"),
        }
    });
    Ok(())
}

/// Axum handler for `POST /events?sessionId=<id>`.
async fn submit_message<F: ProxyFactory>(
    State(state): State<StreamingState<F>>,
    Query(query): Query<SessionQuery>,
    body: Bytes,
) -> Response {
    let session_id = query.session_id.unwrap_or_default();
    let Some(channel) = state.registry.get(&session_id) else {
        tracing::debug!(%session_id, "message for unknown session");
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    };

    match channel.handle_post_message(&body).await {
        Ok(()) => {
            tracing::debug!(%session_id, bytes = body.len(), "message forwarded");
            (StatusCode::ACCEPTED, "Accepted").into_response()
        }
        Err(e) => {
            tracing::warn!(%session_id, error = %e, "error handling SSE message");
            (post_error_status(&e), e.to_string()).into_response()
        }
    }
}

fn post_error_status(error: &TransportError) -> StatusCode {
    match error {
        TransportError::InvalidMessage(_) => StatusCode::BAD_REQUEST,
        TransportError::MessageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use openapi_mcp_core::{McpError, McpHandler, McpResult, RequestContext, ServerInfo, Tool, ToolResult};
    use openapi_mcp_server::McpServer;
    use serde_json::Value;

    #[derive(Clone)]
    struct Silent;

    impl McpHandler for Silent {
        fn server_info(&self) -> ServerInfo {
            ServerInfo::new("silent", "0.1.0")
        }

        fn list_tools(&self) -> Vec<Tool> {
            Vec::new()
        }

        fn call_tool<'a>(
            &'a self,
            name: &'a str,
            _args: Value,
            _ctx: &'a RequestContext,
        ) -> impl Future<Output = McpResult<ToolResult>> + Send + 'a {
            async move { Err(McpError::tool_not_found(name)) }
        }
    }

    #[derive(Default)]
    struct Counting {
        builds: AtomicUsize,
    }

    impl ProxyFactory for Counting {
        type Handler = Silent;

        fn build(&self) -> impl Future<Output = ProxyResult<McpServer<Silent>>> + Send + '_ {
            async move {
                self.builds.fetch_add(1, Ordering::SeqCst);
                Ok(McpServer::new(Silent))
            }
        }
    }

    #[tokio::test]
    async fn test_taken_session_id_is_500_without_building() {
        let state = StreamingState {
            factory: Arc::new(Counting::default()),
            registry: SessionRegistry::new(),
        };
        let (channel, stream) = SseChannel::new(EVENTS_PATH);
        assert!(state.registry.insert(channel.clone()));

        let response = establish_session(&state, channel.clone(), stream).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.factory.builds.load(Ordering::SeqCst), 0);
        assert!(channel.is_closed());
    }

    #[test]
    fn test_post_error_status() {
        assert_eq!(
            post_error_status(&TransportError::InvalidMessage("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            post_error_status(&TransportError::NotConnected),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            post_error_status(&TransportError::Closed),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
