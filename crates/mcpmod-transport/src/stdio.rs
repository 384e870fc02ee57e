//! Newline-delimited JSON framing.
//!
//! Each JSON-RPC message is serialized as a single line of JSON followed by
//! `\n`. The reader and writer halves are separate so that one task can
//! read while responses from many in-flight calls are written concurrently.
//!
//! Logging must go to stderr when these wrap the process stdio.

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use mcpmod_core::protocol::Message;

use crate::error::TransportError;

/// Maximum allowed message size (16 MB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// The reading half: turns lines into messages.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    max_message_size: usize,
    line: Vec<u8>,
}

impl<R> LineReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            max_message_size: MAX_MESSAGE_SIZE,
            line: Vec::new(),
        }
    }

    /// Override the maximum accepted line length.
    #[must_use]
    pub const fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    /// Read the next message.
    ///
    /// Returns `Ok(None)` at end of stream. Blank lines are skipped. A
    /// malformed, non-UTF-8 or oversized line yields a recoverable error and
    /// the next call continues with the following line.
    pub async fn recv(&mut self) -> Result<Option<Message>, TransportError> {
        loop {
            self.line.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.line).await?;
            if bytes_read == 0 {
                return Ok(None);
            }

            if self.line.len() > self.max_message_size {
                return Err(TransportError::MessageTooLarge {
                    size: self.line.len(),
                    max: self.max_message_size,
                });
            }

            let trimmed = std::str::from_utf8(&self.line)?.trim();
            if trimmed.is_empty() {
                continue;
            }

            return Ok(Some(serde_json::from_str(trimmed)?));
        }
    }
}

/// The writing half: serializes one message per line.
///
/// Safe to share between tasks; writes are serialized so lines never
/// interleave.
#[derive(Debug)]
pub struct LineWriter<W> {
    writer: Mutex<W>,
}

impl<W> LineWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Write a message followed by a newline and flush.
    pub async fn send<T: Serialize + Sync>(&self, msg: &T) -> Result<(), TransportError> {
        let json = serde_json::to_string(msg)?;
        if json.len() > MAX_MESSAGE_SIZE {
            return Err(TransportError::MessageTooLarge {
                size: json.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    /// Flush any buffered output.
    pub async fn flush(&self) -> Result<(), TransportError> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpmod_core::protocol::{Request, Response};
    use tokio::io::{AsyncReadExt, BufReader};

    #[tokio::test]
    async fn test_recv_skips_blank_lines_and_stops_at_eof() -> Result<(), Box<dyn std::error::Error>> {
        let input = b"\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\n";
        let mut reader = LineReader::new(BufReader::new(&input[..]));

        let msg = reader.recv().await?.ok_or("expected a message")?;
        assert_eq!(msg.method(), Some("ping"));
        assert!(reader.recv().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_recv_recovers_after_bad_line() -> Result<(), Box<dyn std::error::Error>> {
        let input = b"not json\n{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n";
        let mut reader = LineReader::new(BufReader::new(&input[..]));

        let err = reader.recv().await.unwrap_err();
        assert!(err.is_recoverable());
        let msg = reader.recv().await?.ok_or("expected a message")?;
        assert!(msg.is_notification());
        Ok(())
    }

    #[tokio::test]
    async fn test_recv_recovers_after_invalid_utf8() -> Result<(), Box<dyn std::error::Error>> {
        let input = b"\xff\xfe garbage\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n";
        let mut reader = LineReader::new(BufReader::new(&input[..]));

        let err = reader.recv().await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidUtf8(_)));
        assert!(err.is_recoverable());
        let msg = reader.recv().await?.ok_or("expected a message")?;
        assert_eq!(msg.method(), Some("ping"));
        Ok(())
    }

    #[tokio::test]
    async fn test_recv_rejects_oversized_line() {
        let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n";
        let mut reader = LineReader::new(BufReader::new(&input[..])).with_max_message_size(10);

        let err = reader.recv().await.unwrap_err();
        assert!(matches!(err, TransportError::MessageTooLarge { max: 10, .. }));
    }

    #[tokio::test]
    async fn test_send_writes_one_line_per_message() -> Result<(), Box<dyn std::error::Error>> {
        let (client, server) = tokio::io::duplex(4096);
        let writer = LineWriter::new(server);

        writer.send(&Request::new("ping", 1u64)).await?;
        writer
            .send(&Response::success(1u64, serde_json::json!({})))
            .await?;
        drop(writer);

        let mut out = String::new();
        let mut client = client;
        client.read_to_string(&mut out).await?;
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"method\":\"ping\""));
        assert!(lines[1].contains("\"result\":{}"));
        Ok(())
    }
}
