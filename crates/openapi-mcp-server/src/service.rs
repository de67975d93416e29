//! Protocol-server instances and the serving loop.

use openapi_mcp_core::McpError;
use openapi_mcp_core::handler::McpHandler;
use openapi_mcp_core::jsonrpc::JsonRpcOutgoing;
use openapi_mcp_core::router;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::TransportError;
use crate::transport::Transport;

/// One protocol-server instance wrapping a handler.
///
/// Each instance is meant to serve a single transport; build a fresh one per
/// client session.
#[derive(Debug, Clone)]
pub struct McpServer<H> {
    handler: H,
}

impl<H: McpHandler> McpServer<H> {
    /// Wrap a handler.
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// The underlying handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Attach to `transport` and begin serving in the background.
    ///
    /// # Errors
    ///
    /// Returns the transport's start error, e.g. [`TransportError::Closed`]
    /// when the client disconnected before the server was attached.
    pub async fn connect<T: Transport>(&self, mut transport: T) -> Result<RunningService, TransportError> {
        transport.start().await?;
        let handler = self.handler.clone();
        let task = tokio::spawn(serve(handler, transport));
        Ok(RunningService { task })
    }
}

/// Handle to a server attached to a transport.
#[derive(Debug)]
pub struct RunningService {
    task: JoinHandle<Result<(), TransportError>>,
}

impl RunningService {
    /// Wait until the transport closes.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the serving loop, or
    /// [`TransportError::Join`] if the task panicked.
    pub async fn waiting(self) -> Result<(), TransportError> {
        self.task.await?
    }
}

/// Read, dispatch and answer messages until the transport closes.
///
/// Every request runs on its own task so a slow tool call never stalls reading;
/// responses are written back as they complete.
async fn serve<H: McpHandler, T: Transport>(handler: H, mut transport: T) -> Result<(), TransportError> {
    let ctx = transport.context();
    let (response_tx, mut response_rx) = mpsc::channel::<JsonRpcOutgoing>(32);

    tracing::debug!(transport = ctx.transport.as_str(), session_id = ?ctx.session_id, "serving");

    let result = loop {
        tokio::select! {
            incoming = transport.receive() => {
                match incoming {
                    Ok(Some(message)) => match router::parse_request(&message) {
                        Ok(request) => {
                            tracing::debug!(method = %request.method, "dispatching request");
                            let handler = handler.clone();
                            let ctx = ctx.clone();
                            let tx = response_tx.clone();
                            tokio::spawn(async move {
                                let response = router::route_request(&handler, request, &ctx).await;
                                // Loop already exited; nothing left to answer.
                                let _ = tx.send(response).await;
                            });
                        }
                        Err(e) => {
                            if let Err(e) = write_response(&mut transport, &JsonRpcOutgoing::error(None, e)).await {
                                break Err(e);
                            }
                        }
                    },
                    Ok(None) => break Ok(()),
                    Err(e) if e.is_recoverable() => {
                        let error = match &e {
                            TransportError::MessageTooLarge { .. } => McpError::invalid_request(e.to_string()),
                            _ => McpError::parse_error(e.to_string()),
                        };
                        if let Err(e) = write_response(&mut transport, &JsonRpcOutgoing::error(None, error)).await {
                            break Err(e);
                        }
                    }
                    Err(e) => break Err(e),
                }
            }

            Some(response) = response_rx.recv() => {
                if let Err(e) = write_response(&mut transport, &response).await {
                    break Err(e);
                }
            }
        }
    };

    // Flush responses from requests that were already in flight.
    drop(response_tx);
    if result.is_ok() {
        while let Some(response) = response_rx.recv().await {
            if let Err(e) = write_response(&mut transport, &response).await {
                tracing::debug!(error = %e, "dropping response after transport end");
                break;
            }
        }
    }

    transport.close().await;
    tracing::debug!(session_id = ?ctx.session_id, "serving loop finished");
    result
}

async fn write_response<T: Transport>(transport: &mut T, response: &JsonRpcOutgoing) -> Result<(), TransportError> {
    if !response.should_send() {
        return Ok(());
    }
    let message = router::serialize_response(response)
        .map_err(|e| TransportError::InvalidMessage(e.message))?;
    transport.send(message).await
}
