//! Server-Sent Events session transport.
//!
//! One [`SseChannel`] backs one connected client. The HTTP layer returns the
//! paired [`SseEventStream`] as the body of the long-lived `GET` and feeds
//! `POST`ed payloads into [`SseChannel::handle_post_message`]. A server is
//! attached through [`SseChannel::transport`].
//!
//! The first event on the stream is `endpoint`, whose data is the URL the
//! client must `POST` to (`<path>?sessionId=<id>`). Responses follow as
//! `message` events.
//!
//! Dropping the event stream (the client went away) closes the channel, which
//! runs every close callback exactly once.

use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::response::sse::Event;
use futures::Stream;
use openapi_mcp_core::context::RequestContext;
use openapi_mcp_core::jsonrpc::JsonRpcIncoming;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::Transport;
use crate::error::TransportError;

/// Capacity of the per-session inbound and outbound queues.
const CHANNEL_CAPACITY: usize = 64;

type CloseCallback = Box<dyn FnOnce() + Send + 'static>;

struct ChannelInner {
    session_id: String,
    endpoint: String,
    inbound_tx: mpsc::Sender<String>,
    inbound_rx: Mutex<Option<mpsc::Receiver<String>>>,
    outbound_tx: mpsc::Sender<String>,
    started: AtomicBool,
    closed: AtomicBool,
    cancel: CancellationToken,
    on_close: Mutex<Vec<CloseCallback>>,
}

/// Shared handle to one SSE session.
///
/// Cheap to clone; every clone refers to the same session.
#[derive(Clone)]
pub struct SseChannel {
    inner: Arc<ChannelInner>,
}

impl SseChannel {
    /// Create a channel whose clients post to `message_path`.
    ///
    /// Returns the channel handle and the event stream to serve as the
    /// response body.
    pub fn new(message_path: &str) -> (Self, SseEventStream) {
        let session_id = Uuid::new_v4().to_string();
        let endpoint = format!("{message_path}?sessionId={session_id}");
        let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let channel = Self {
            inner: Arc::new(ChannelInner {
                session_id,
                endpoint,
                inbound_tx,
                inbound_rx: Mutex::new(Some(inbound_rx)),
                outbound_tx,
                started: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                on_close: Mutex::new(Vec::new()),
            }),
        };

        let stream = SseEventStream::new(channel.clone(), outbound_rx);
        (channel, stream)
    }

    /// The unique identifier minted for this session.
    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// The URL announced to the client in the `endpoint` event.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Whether the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Whether a server has been attached to the channel.
    pub fn is_connected(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst) && !self.is_closed()
    }

    /// Register a callback to run once when the channel closes.
    ///
    /// If the channel is already closed the callback runs immediately.
    pub fn on_close(&self, callback: impl FnOnce() + Send + 'static) {
        let mut callbacks = self.inner.on_close.lock();
        if self.is_closed() {
            drop(callbacks);
            callback();
            return;
        }
        callbacks.push(Box::new(callback));
    }

    /// Close the channel: end the event stream, stop the attached server and
    /// run the close callbacks. Later calls are no-ops.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.cancel.cancel();

        let callbacks = std::mem::take(&mut *self.inner.on_close.lock());
        for callback in callbacks {
            callback();
        }
        tracing::debug!(session_id = %self.inner.session_id, "SSE channel closed");
    }

    /// Accept one `POST`ed payload and queue it for the attached server.
    ///
    /// Messages are delivered in the order this method is called.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Closed`] if the session has ended.
    /// - [`TransportError::NotConnected`] if no server is attached yet.
    /// - [`TransportError::InvalidMessage`] if the body is not a JSON-RPC message.
    pub async fn handle_post_message(&self, body: &[u8]) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        if !self.inner.started.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }

        let text =
            std::str::from_utf8(body).map_err(|e| TransportError::InvalidMessage(e.to_string()))?;
        JsonRpcIncoming::parse(text).map_err(|e| TransportError::InvalidMessage(e.to_string()))?;

        self.inner
            .inbound_tx
            .send(text.to_string())
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// A transport that attaches a server to this channel.
    ///
    /// Only one transport per channel can be started.
    pub fn transport(&self) -> SseTransport {
        SseTransport {
            channel: self.clone(),
            inbound: None,
        }
    }
}

impl fmt::Debug for SseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseChannel")
            .field("session_id", &self.inner.session_id)
            .field("connected", &self.is_connected())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// The server side of an [`SseChannel`].
pub struct SseTransport {
    channel: SseChannel,
    inbound: Option<mpsc::Receiver<String>>,
}

impl fmt::Debug for SseTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseTransport")
            .field("channel", &self.channel)
            .field("started", &self.inbound.is_some())
            .finish()
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn start(&mut self) -> Result<(), TransportError> {
        if self.channel.is_closed() {
            return Err(TransportError::Closed);
        }
        let receiver = self
            .channel
            .inner
            .inbound_rx
            .lock()
            .take()
            .ok_or(TransportError::AlreadyStarted)?;
        self.inbound = Some(receiver);
        self.channel.inner.started.store(true, Ordering::SeqCst);
        tracing::debug!(session_id = %self.channel.session_id(), "SSE transport started");
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<String>, TransportError> {
        let cancel = self.channel.inner.cancel.clone();
        let Some(inbound) = self.inbound.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        tokio::select! {
            () = cancel.cancelled() => Ok(None),
            message = inbound.recv() => Ok(message),
        }
    }

    async fn send(&mut self, message: String) -> Result<(), TransportError> {
        if self.channel.is_closed() {
            return Err(TransportError::Closed);
        }
        self.channel
            .inner
            .outbound_tx
            .send(message)
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) {
        self.channel.close();
    }

    fn context(&self) -> RequestContext {
        RequestContext::sse(self.channel.session_id())
    }
}

/// The event stream returned as the SSE response body.
///
/// Yields the `endpoint` event, then one `message` event per server response,
/// and ends when the channel closes. Dropping it closes the channel.
pub struct SseEventStream {
    inner: Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>,
    channel: SseChannel,
}

impl SseEventStream {
    fn new(channel: SseChannel, mut outbound: mpsc::Receiver<String>) -> Self {
        let endpoint = channel.endpoint().to_string();
        let cancel = channel.inner.cancel.clone();

        let stream = async_stream::stream! {
            yield Ok(Event::default().event("endpoint").data(endpoint));

            loop {
                let next = tokio::select! {
                    () = cancel.cancelled() => None,
                    message = outbound.recv() => message,
                };
                match next {
                    Some(message) => yield Ok(Event::default().event("message").data(message)),
                    None => break,
                }
            }
        };

        Self {
            inner: Box::pin(stream),
            channel,
        }
    }
}

impl Stream for SseEventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for SseEventStream {
    fn drop(&mut self) {
        self.channel.close();
    }
}

impl fmt::Debug for SseEventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseEventStream")
            .field("session_id", &self.channel.session_id())
            .finish_non_exhaustive()
    }
}
