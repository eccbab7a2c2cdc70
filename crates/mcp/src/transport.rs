//! MCP transport layer.
//!
//! Newline-delimited JSON framing over any async byte stream pair. The
//! writer emits one JSON object per line; the reader yields parsed
//! messages and silently skips lines that are not JSON-RPC objects (sidecars
//! routinely print log noise on stdout).

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::McpError;
use crate::types::IncomingMessage;

pub type BoxedReader = Box<dyn AsyncBufRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Outbound half: serializes messages as single lines.
pub struct FrameWriter {
    inner: BoxedWriter,
}

impl FrameWriter {
    pub fn new(inner: BoxedWriter) -> Self {
        Self { inner }
    }

    /// Write one message followed by `\n` and flush.
    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<(), McpError> {
        // serde_json escapes embedded newlines, so one message is always one line.
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        self.inner.write_all(line.as_bytes()).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Close the stream so the peer sees EOF.
    pub async fn close(&mut self) -> Result<(), McpError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

/// Inbound half: yields protocol messages, skipping everything else.
pub struct FrameReader {
    inner: BoxedReader,
    buf: Vec<u8>,
}

impl FrameReader {
    pub fn new(inner: BoxedReader) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(4096),
        }
    }

    /// Read until the next parseable message.
    /// Returns `None` when the stream is closed.
    pub async fn next_message(&mut self) -> Result<Option<IncomingMessage>, McpError> {
        loop {
            self.buf.clear();
            let bytes_read = self.inner.read_until(b'\n', &mut self.buf).await?;
            if bytes_read == 0 {
                return Ok(None); // EOF
            }

            // Invalid UTF-8 is noise like any other unparseable line.
            let line = String::from_utf8_lossy(&self.buf);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<IncomingMessage>(trimmed) {
                Ok(message) => return Ok(Some(message)),
                Err(e) => {
                    debug!(error = %e, line = %truncate(trimmed, 200), "discarding non-protocol output");
                }
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
