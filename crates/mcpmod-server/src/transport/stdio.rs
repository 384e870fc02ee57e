//! MCP over standard input and output.
//!
//! Each line read is dispatched on its own task so a slow tool call does not
//! hold up the next message; responses are written as they complete. At end
//! of input the server waits for calls still in flight before returning.
//!
//! Logging must be routed to stderr while this server owns stdout.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::task::JoinSet;

use mcpmod_core::protocol::Response;
use mcpmod_transport::{LineReader, LineWriter, MAX_MESSAGE_SIZE};

use crate::engine::McpEngine;
use crate::error::ServerError;
use crate::propagation::StdioContextHandler;
use crate::transport::ServerStatus;

/// The stdio transport server.
pub struct StdioServer {
    engine: Arc<McpEngine>,
    contexts: Arc<dyn StdioContextHandler>,
    max_message_size: usize,
    running: AtomicBool,
}

impl StdioServer {
    /// Create a server dispatching to `engine`.
    pub fn new(engine: Arc<McpEngine>, contexts: Arc<dyn StdioContextHandler>) -> Self {
        Self {
            engine,
            contexts,
            max_message_size: MAX_MESSAGE_SIZE,
            running: AtomicBool::new(false),
        }
    }

    /// Override the longest accepted input line.
    #[must_use]
    pub const fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    /// Serve the process stdin and stdout until stdin closes.
    pub async fn start(&self) -> Result<(), ServerError> {
        tracing::info!("starting MCP Stdio server");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve an arbitrary reader and writer until the reader ends.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.running.store(true, Ordering::Release);
        let result = self.run(reader, writer).await;
        self.running.store(false, Ordering::Release);
        result
    }

    async fn run<R, W>(&self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut reader = LineReader::new(reader).with_max_message_size(self.max_message_size);
        let writer = Arc::new(LineWriter::new(writer));
        let mut in_flight = JoinSet::new();

        let outcome = loop {
            while in_flight.try_join_next().is_some() {}

            let message = match reader.recv().await {
                Ok(Some(message)) => message,
                Ok(None) => break Ok(()),
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(error = %e, "invalid MCP message on stdin");
                    send(&writer, &Response::parse_error(e.to_string())).await;
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "MCP Stdio server read failed");
                    break Err(ServerError::Transport(e));
                }
            };

            let ctx = self.contexts.derive();
            let engine = Arc::clone(&self.engine);
            let writer = Arc::clone(&writer);
            in_flight.spawn(async move {
                if let Some(response) = engine.handle_message(message, ctx).await {
                    send(&writer, &response).await;
                }
            });
        };

        while in_flight.join_next().await.is_some() {}

        if let Err(e) = writer.flush().await {
            tracing::warn!(error = %e, "failed to flush stdout");
        }

        outcome
    }

    /// Whether the server is serving.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Status for introspection.
    #[must_use]
    pub fn info(&self) -> ServerStatus {
        ServerStatus {
            running: self.is_running(),
        }
    }
}

impl std::fmt::Debug for StdioServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioServer")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

async fn send<W, T>(writer: &LineWriter<W>, message: &T)
where
    W: AsyncWrite + Unpin + Send,
    T: Serialize + Sync,
{
    if let Err(e) = writer.send(message).await {
        tracing::error!(error = %e, "failed to write MCP response");
    }
}
