//! Type-erased capability handlers.
//!
//! A handler is any async function taking the request context and the typed
//! request. Wrapping it in a [`Handler`] boxes the future so handlers of
//! different concrete types can live in one table, and records the
//! function's type name so registries can report what implements what.
//!
//! ```rust
//! use mcpmod_core::types::{CallToolRequest, CallToolResult};
//! use mcpmod_server::handler::ToolHandler;
//!
//! let handler = ToolHandler::new(|_ctx, req: CallToolRequest| async move {
//!     Ok(CallToolResult::text(format!("called {}", req.name)))
//! });
//! assert!(!handler.identity().is_empty());
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use mcpmod_core::error::McpError;
use mcpmod_core::types::{
    CallToolRequest, CallToolResult, GetPromptRequest, GetPromptResult, ReadResourceRequest,
    ResourceContents,
};

use crate::context::RequestContext;

type HandlerFn<Req, Res> =
    dyn Fn(RequestContext, Req) -> BoxFuture<'static, Result<Res, McpError>> + Send + Sync;

/// An async request handler.
pub struct Handler<Req, Res> {
    func: Arc<HandlerFn<Req, Res>>,
    identity: &'static str,
}

impl<Req, Res> Handler<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Wrap an async function.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, McpError>> + Send + 'static,
    {
        Self {
            identity: std::any::type_name::<F>(),
            func: Arc::new(move |ctx, req| f(ctx, req).boxed()),
        }
    }

    /// Replace the reported identity.
    #[must_use]
    pub const fn named(mut self, identity: &'static str) -> Self {
        self.identity = identity;
        self
    }

    /// Invoke the handler.
    pub fn call(&self, ctx: RequestContext, req: Req) -> BoxFuture<'static, Result<Res, McpError>> {
        (self.func)(ctx, req)
    }

    /// The type name of the wrapped function.
    #[must_use]
    pub const fn identity(&self) -> &'static str {
        self.identity
    }
}

impl<Req, Res> Clone for Handler<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            identity: self.identity,
        }
    }
}

impl<Req, Res> fmt::Debug for Handler<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Handles `tools/call` for one tool.
pub type ToolHandler = Handler<CallToolRequest, CallToolResult>;

/// Handles `prompts/get` for one prompt.
pub type PromptHandler = Handler<GetPromptRequest, GetPromptResult>;

/// Handles `resources/read` for one static resource.
pub type ResourceHandler = Handler<ReadResourceRequest, Vec<ResourceContents>>;

/// Handles `resources/read` for every URI matching one template.
pub type ResourceTemplateHandler = Handler<ReadResourceRequest, Vec<ResourceContents>>;
