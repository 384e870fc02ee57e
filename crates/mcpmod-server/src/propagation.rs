//! Deriving a [`RequestContext`] from transport input.
//!
//! The SSE transport honours a client-supplied `X-Request-Id` header and
//! generates an id otherwise; stdio always generates one. Both handlers are
//! traits so embedders can substitute their own correlation scheme.

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::context::{RequestContext, TransportKind};

/// Header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Source of fresh request ids.
pub trait IdGenerator: Send + Sync {
    /// Produce a new id.
    fn generate(&self) -> String;
}

/// Random UUID v4 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Builds contexts for requests arriving over SSE.
pub trait SseContextHandler: Send + Sync {
    /// Derive the context of a `POST`ed message.
    fn derive(&self, session_id: &str, headers: &HeaderMap) -> RequestContext;
}

/// Builds contexts for requests arriving over stdio.
pub trait StdioContextHandler: Send + Sync {
    /// Derive the context of one line.
    fn derive(&self) -> RequestContext;
}

/// Default SSE context handler.
#[derive(Clone)]
pub struct DefaultSseContextHandler {
    ids: Arc<dyn IdGenerator>,
}

impl DefaultSseContextHandler {
    /// Use `ids` when the client sends no request id.
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }
}

impl Default for DefaultSseContextHandler {
    fn default() -> Self {
        Self::new(Arc::new(UuidGenerator))
    }
}

impl SseContextHandler for DefaultSseContextHandler {
    fn derive(&self, session_id: &str, headers: &HeaderMap) -> RequestContext {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map_or_else(|| self.ids.generate(), str::to_string);
        RequestContext::new(request_id, session_id, TransportKind::Sse)
    }
}

/// Default stdio context handler.
#[derive(Clone)]
pub struct DefaultStdioContextHandler {
    ids: Arc<dyn IdGenerator>,
}

impl DefaultStdioContextHandler {
    /// Generate request ids with `ids`.
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }
}

impl Default for DefaultStdioContextHandler {
    fn default() -> Self {
        Self::new(Arc::new(UuidGenerator))
    }
}

impl StdioContextHandler for DefaultStdioContextHandler {
    fn derive(&self) -> RequestContext {
        RequestContext::new(self.ids.generate(), "", TransportKind::Stdio)
    }
}
