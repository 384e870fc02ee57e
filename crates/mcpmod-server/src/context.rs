//! Per-request context.
//!
//! A [`RequestContext`] is derived by a transport for every incoming message
//! and travels, by value, through hooks and into the capability handler. It
//! carries the correlation identifiers, the transport kind, the instant the
//! request was received and the request span.
//!
//! Cloning is cheap; all clones share one inner value.
//!
//! # Example
//!
//! ```rust
//! use mcpmod_server::context::{RequestContext, TransportKind};
//!
//! let ctx = RequestContext::new("req-1", "session-1", TransportKind::Sse);
//! assert_eq!(ctx.request_id(), "req-1");
//! assert_eq!(ctx.session_id(), "session-1");
//! assert_eq!(ctx.transport().as_str(), "sse");
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Span;
use tracing::field::Empty;

/// Value of the `system` attribute on every request span and log record.
pub const SYSTEM: &str = "mcpserver";

/// The transport a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// HTTP with Server-Sent Events.
    Sse,
    /// Newline-delimited JSON over stdin/stdout.
    Stdio,
}

impl TransportKind {
    /// Attribute value for this transport.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sse => "sse",
            Self::Stdio => "stdio",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Inner {
    request_id: String,
    session_id: String,
    transport: TransportKind,
    started_at: Instant,
    span: Span,
}

/// Context carried by one request.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<Inner>,
}

impl RequestContext {
    /// Create a context and open its request span.
    ///
    /// The start instant is taken first so the recorded latency covers span
    /// creation too.
    pub fn new(
        request_id: impl Into<String>,
        session_id: impl Into<String>,
        transport: TransportKind,
    ) -> Self {
        let started_at = Instant::now();
        let request_id = request_id.into();
        let session_id = session_id.into();

        let span = tracing::info_span!(
            parent: None,
            "MCP",
            otel.name = "MCP",
            otel.kind = "server",
            otel.status_code = Empty,
            otel.status_message = Empty,
            system = SYSTEM,
            mcp.transport = transport.as_str(),
            mcp.sessionID = %session_id,
            mcp.requestID = %request_id,
            mcp.latency = Empty,
            mcp.method = Empty,
            mcp.request = Empty,
            mcp.response = Empty,
            mcp.error = Empty,
            mcp.resource = Empty,
            mcp.prompt = Empty,
            mcp.tool = Empty,
        );

        Self {
            inner: Arc::new(Inner {
                request_id,
                session_id,
                transport,
                started_at,
                span,
            }),
        }
    }

    /// The request correlation id.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.inner.request_id
    }

    /// The session id; empty on stdio.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// The transport the request arrived on.
    #[must_use]
    pub fn transport(&self) -> TransportKind {
        self.inner.transport
    }

    /// When the request was received.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.inner.started_at
    }

    /// Time elapsed since the request was received.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    /// The request span. Handlers may parent their own events on it.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.inner.span
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.inner.request_id)
            .field("session_id", &self.inner.session_id)
            .field("transport", &self.inner.transport)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kind_names() {
        assert_eq!(TransportKind::Sse.as_str(), "sse");
        assert_eq!(TransportKind::Stdio.to_string(), "stdio");
    }

    #[test]
    fn test_clones_share_identity() {
        let ctx = RequestContext::new("r", "", TransportKind::Stdio);
        let other = ctx.clone();
        assert_eq!(other.request_id(), "r");
        assert_eq!(other.session_id(), "");
        assert_eq!(ctx.started_at(), other.started_at());
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let ctx = RequestContext::new("r", "s", TransportKind::Sse);
        let first = ctx.elapsed();
        let second = ctx.elapsed();
        assert!(second >= first);
    }
}
