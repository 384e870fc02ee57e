//! Server-Sent Events plumbing.
//!
//! The SSE transport pairs a long-lived `GET` event stream with `POST`
//! message submissions. Responses to submitted messages travel back on the
//! event stream of the session named in the `sessionId` query parameter;
//! [`SessionRegistry`] is the table that makes that routing possible.

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Event name of the first event on a stream, carrying the message URL.
pub const ENDPOINT_EVENT: &str = "endpoint";

/// Event name of events carrying a JSON-RPC message.
pub const MESSAGE_EVENT: &str = "message";

/// Build the URL a client must `POST` its messages to.
///
/// ```
/// use mcpmod_transport::endpoint_url;
///
/// assert_eq!(
///     endpoint_url("http://localhost:8082", "/mcp", "/message", "abc"),
///     "http://localhost:8082/mcp/message?sessionId=abc",
/// );
/// ```
#[must_use]
pub fn endpoint_url(
    base_url: &str,
    base_path: &str,
    message_endpoint: &str,
    session_id: &str,
) -> String {
    format!("{base_url}{base_path}{message_endpoint}?sessionId={session_id}")
}

/// Open event streams, keyed by session id.
///
/// Each session owns an unbounded channel; the receiving end is drained by
/// the HTTP response streaming events to the client.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, mpsc::UnboundedSender<String>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return the receiving end of its stream.
    ///
    /// Registering an id twice replaces the earlier stream, which then ends.
    pub fn open(&self, session_id: impl Into<String>) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.insert(session_id.into(), tx);
        rx
    }

    /// Check whether a session is open.
    #[must_use]
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Queue a payload onto a session's stream.
    pub fn send(&self, session_id: &str, payload: String) -> Result<(), TransportError> {
        let Some(tx) = self.sessions.get(session_id) else {
            return Err(TransportError::UnknownSession {
                session_id: session_id.to_string(),
            });
        };
        tx.send(payload).map_err(|_| TransportError::SessionClosed {
            session_id: session_id.to_string(),
        })
    }

    /// Remove a session; its stream ends once queued payloads are drained.
    pub fn close(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Remove every session.
    pub fn close_all(&self) {
        self.sessions.clear();
    }

    /// Number of open sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// One parsed event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// The `event:` field, if any.
    pub event: Option<String>,
    /// The joined `data:` lines.
    pub data: String,
    /// The `id:` field, if any.
    pub id: Option<String>,
}

/// Incremental parser for an event stream body.
///
/// Feed it chunks as they arrive; complete events come out, partial ones
/// stay buffered. Comment lines (keep-alives) are dropped.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
}

impl SseParser {
    /// Create an empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the events it completed.
    pub fn push(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(&chunk.replace("\r\n", "\n"));

        let mut events = Vec::new();
        while let Some(event_end) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..event_end + 2).collect();

            let mut event = SseEvent::default();
            let mut data_lines = Vec::new();
            for line in block.lines() {
                if let Some(data) = line.strip_prefix("data:") {
                    data_lines.push(data.strip_prefix(' ').unwrap_or(data));
                } else if let Some(name) = line.strip_prefix("event:") {
                    event.event = Some(name.trim().to_string());
                } else if let Some(id) = line.strip_prefix("id:") {
                    event.id = Some(id.trim().to_string());
                }
            }

            if data_lines.is_empty() && event.event.is_none() {
                continue;
            }
            event.data = data_lines.join("\n");
            events.push(event);
        }
        events
    }
}
