//! Newline-delimited JSON-RPC over any async reader/writer pair.

use std::fmt;

use async_trait::async_trait;
use openapi_mcp_core::context::RequestContext;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::{MAX_MESSAGE_SIZE, Transport};
use crate::error::TransportError;

/// Line-based transport used for stdio.
///
/// The partially read line lives in the struct so a `receive` cancelled by
/// `select!` resumes where it stopped instead of dropping bytes.
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    buffer: Vec<u8>,
    context: RequestContext,
    started: bool,
    closed: bool,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Create a transport reading requests from `reader` and writing responses
    /// to `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            buffer: Vec::new(),
            context: RequestContext::stdio(),
            started: false,
            closed: false,
        }
    }
}

impl<R, W> fmt::Debug for LineTransport<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineTransport")
            .field("transport", &self.context.transport)
            .field("started", &self.started)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn start(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if self.started {
            return Err(TransportError::AlreadyStarted);
        }
        self.started = true;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<String>, TransportError> {
        if self.closed {
            return Ok(None);
        }

        loop {
            let read = self.reader.read_until(b'\n', &mut self.buffer).await?;
            if read == 0 && self.buffer.is_empty() {
                return Ok(None);
            }

            let line = std::mem::take(&mut self.buffer);
            if line.len() > MAX_MESSAGE_SIZE {
                return Err(TransportError::MessageTooLarge {
                    size: line.len(),
                    max: MAX_MESSAGE_SIZE,
                });
            }

            let text =
                String::from_utf8(line).map_err(|e| TransportError::InvalidMessage(e.to_string()))?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                if read == 0 {
                    return Ok(None);
                }
                continue;
            }
            return Ok(Some(trimmed.to_string()));
        }
    }

    async fn send(&mut self, message: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.writer.shutdown().await {
            tracing::debug!(error = %e, "failed to shut down line writer");
        }
    }

    fn context(&self) -> RequestContext {
        self.context.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::BufReader;

    fn transport(input: &str) -> LineTransport<BufReader<Cursor<Vec<u8>>>, Vec<u8>> {
        LineTransport::new(BufReader::new(Cursor::new(input.as_bytes().to_vec())), Vec::new())
    }

    #[tokio::test]
    async fn test_skips_blank_lines() {
        let mut t = transport("\n\n{\"a\":1}\n\n");
        assert_eq!(t.receive().await.unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(t.receive().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_final_line_without_newline() {
        let mut t = transport("{\"a\":1}\n{\"b\":2}");
        assert_eq!(t.receive().await.unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(t.receive().await.unwrap().as_deref(), Some("{\"b\":2}"));
        assert!(t.receive().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_line_is_recoverable() {
        let input = format!("{}\n{{\"ok\":true}}\n", "x".repeat(MAX_MESSAGE_SIZE + 1));
        let mut t = transport(&input);
        let err = t.receive().await.unwrap_err();
        assert!(matches!(err, TransportError::MessageTooLarge { .. }));
        assert!(err.is_recoverable());
        assert_eq!(t.receive().await.unwrap().as_deref(), Some("{\"ok\":true}"));
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let mut t = transport("");
        t.start().await.unwrap();
        assert!(matches!(t.start().await, Err(TransportError::AlreadyStarted)));
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let mut t = transport("");
        t.close().await;
        assert!(matches!(t.send("{}".into()).await, Err(TransportError::Closed)));
    }
}
