//! Dispatch hooks and the instrumentation built on them.
//!
//! The engine calls into a [`Hooks`] value at four points:
//!
//! - `on_register_session` when an SSE stream opens
//! - `before_any` once a request has been decoded
//! - `on_success` when a request produced a result
//! - `on_error` when a request failed, for whatever reason
//!
//! Exactly one of `on_success` and `on_error` runs per request.
//! Notifications never reach the hooks.
//!
//! [`HooksProvider`] builds the hooks that close each request span, emit
//! the per-request log record and feed [`RequestMetrics`].

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use mcpmod_core::error::McpError;
use mcpmod_core::protocol::RequestId;

use crate::config::{ModuleConfig, PayloadConfig};
use crate::context::{RequestContext, SYSTEM};
use crate::metrics::{Outcome, RequestMetrics};
use crate::router::{ParsedRequest, Target};

/// Called when an SSE session opens.
pub type OnRegisterSessionHook = Arc<dyn Fn(&RequestContext, &str) + Send + Sync>;

/// Called after a request has been decoded, before dispatch.
pub type BeforeAnyHook = Arc<dyn Fn(&RequestContext, &RequestId, &ParsedRequest) + Send + Sync>;

/// Called with the serialized result of a successful request.
pub type OnSuccessHook =
    Arc<dyn Fn(&RequestContext, &RequestId, &str, &ParsedRequest, &Value) + Send + Sync>;

/// Called with the error of a failed request.
pub type OnErrorHook =
    Arc<dyn Fn(&RequestContext, &RequestId, &str, &ParsedRequest, &McpError) + Send + Sync>;

/// Hook lists, run in registration order.
#[derive(Clone, Default)]
pub struct Hooks {
    on_register_session: Vec<OnRegisterSessionHook>,
    before_any: Vec<BeforeAnyHook>,
    on_success: Vec<OnSuccessHook>,
    on_error: Vec<OnErrorHook>,
}

impl Hooks {
    /// No hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session registration hook.
    pub fn add_on_register_session(
        &mut self,
        hook: impl Fn(&RequestContext, &str) + Send + Sync + 'static,
    ) {
        self.on_register_session.push(Arc::new(hook));
    }

    /// Add a pre-dispatch hook.
    pub fn add_before_any(
        &mut self,
        hook: impl Fn(&RequestContext, &RequestId, &ParsedRequest) + Send + Sync + 'static,
    ) {
        self.before_any.push(Arc::new(hook));
    }

    /// Add a success hook.
    pub fn add_on_success(
        &mut self,
        hook: impl Fn(&RequestContext, &RequestId, &str, &ParsedRequest, &Value)
        + Send
        + Sync
        + 'static,
    ) {
        self.on_success.push(Arc::new(hook));
    }

    /// Add an error hook.
    pub fn add_on_error(
        &mut self,
        hook: impl Fn(&RequestContext, &RequestId, &str, &ParsedRequest, &McpError)
        + Send
        + Sync
        + 'static,
    ) {
        self.on_error.push(Arc::new(hook));
    }

    /// Append every hook of `other`.
    pub fn merge(&mut self, other: Self) {
        self.on_register_session.extend(other.on_register_session);
        self.before_any.extend(other.before_any);
        self.on_success.extend(other.on_success);
        self.on_error.extend(other.on_error);
    }

    pub(crate) fn register_session(&self, ctx: &RequestContext, session_id: &str) {
        for hook in &self.on_register_session {
            hook(ctx, session_id);
        }
    }

    pub(crate) fn before_any(&self, ctx: &RequestContext, id: &RequestId, req: &ParsedRequest) {
        for hook in &self.before_any {
            hook(ctx, id, req);
        }
    }

    pub(crate) fn success(
        &self,
        ctx: &RequestContext,
        id: &RequestId,
        req: &ParsedRequest,
        result: &Value,
    ) {
        for hook in &self.on_success {
            hook(ctx, id, req.method(), req, result);
        }
    }

    pub(crate) fn error(
        &self,
        ctx: &RequestContext,
        id: &RequestId,
        req: &ParsedRequest,
        err: &McpError,
    ) {
        for hook in &self.on_error {
            hook(ctx, id, req.method(), req, err);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_register_session", &self.on_register_session.len())
            .field("before_any", &self.before_any.len())
            .field("on_success", &self.on_success.len())
            .field("on_error", &self.on_error.len())
            .finish()
    }
}

/// Builds the tracing, logging and metrics hooks.
#[derive(Debug, Clone)]
pub struct HooksProvider {
    trace: PayloadConfig,
    log: PayloadConfig,
    metrics: Option<Arc<RequestMetrics>>,
}

impl HooksProvider {
    /// Take payload and exclusion settings from `config`; observe into
    /// `metrics` when given.
    #[must_use]
    pub fn new(config: &ModuleConfig, metrics: Option<Arc<RequestMetrics>>) -> Self {
        Self {
            trace: config.trace.clone(),
            log: config.log.clone(),
            metrics,
        }
    }

    /// Produce the hooks.
    #[must_use]
    pub fn provide(&self) -> Hooks {
        let mut hooks = Hooks::new();

        hooks.add_on_register_session(|ctx, session_id| {
            tracing::info!(
                parent: ctx.span(),
                system = SYSTEM,
                mcpSessionID = session_id,
                "MCP session registered"
            );
        });

        let this = self.clone();
        hooks.add_on_success(move |ctx, _id, method, req, result| {
            this.on_success(ctx, method, req, result);
        });

        let this = self.clone();
        hooks.add_on_error(move |ctx, _id, method, req, err| {
            this.on_error(ctx, method, req, err);
        });

        hooks
    }

    fn on_success(&self, ctx: &RequestContext, method: &str, req: &ParsedRequest, result: &Value) {
        let latency = ctx.elapsed();
        let target = req.target();

        let request_json = (self.trace.request || self.log.request)
            .then(|| req.to_json().ok())
            .flatten()
            .map(|v| v.to_string());
        let response_json =
            (self.trace.response || self.log.response).then(|| result.to_string());

        if !self.trace.excludes(method) {
            let span = ctx.span();
            span.record("otel.name", span_name(method, target));
            span.record("otel.status_code", "ok");
            span.record("otel.status_message", "MCP request success");
            span.record("mcp.latency", tracing::field::debug(latency));
            span.record("mcp.method", method);
            if self.trace.request {
                if let Some(json) = &request_json {
                    span.record("mcp.request", json.as_str());
                }
            }
            if self.trace.response {
                if let Some(json) = &response_json {
                    span.record("mcp.response", json.as_str());
                }
            }
            record_target(ctx, target);
        }

        if !self.log.excludes(method) {
            let (resource, prompt, tool) = target_fields(target);
            tracing::info!(
                parent: ctx.span(),
                system = SYSTEM,
                mcpTransport = ctx.transport().as_str(),
                mcpSessionID = ctx.session_id(),
                mcpRequestID = ctx.request_id(),
                mcpLatency = ?latency,
                mcpMethod = method,
                mcpRequest = request_json.as_deref().filter(|_| self.log.request),
                mcpResponse = response_json.as_deref().filter(|_| self.log.response),
                mcpResourceURI = resource,
                mcpPrompt = prompt,
                mcpTool = tool,
                "MCP request success"
            );
        }

        if let Some(metrics) = &self.metrics {
            metrics.observe(method, target.as_str(), Outcome::Success, latency);
        }
    }

    fn on_error(&self, ctx: &RequestContext, method: &str, req: &ParsedRequest, err: &McpError) {
        let latency = ctx.elapsed();
        let target = req.target();
        let message = err.to_string();

        let request_json = (self.trace.request || self.log.request)
            .then(|| req.to_json().ok())
            .flatten()
            .map(|v| v.to_string());

        if !self.trace.excludes(method) {
            let span = ctx.span();
            span.record("otel.name", span_name(method, target));
            span.record("otel.status_code", "error");
            span.record("otel.status_message", message.as_str());
            span.record("mcp.latency", tracing::field::debug(latency));
            span.record("mcp.method", method);
            span.record("mcp.error", message.as_str());
            if self.trace.request {
                if let Some(json) = &request_json {
                    span.record("mcp.request", json.as_str());
                }
            }
            record_target(ctx, target);
        }

        if !self.log.excludes(method) {
            let (resource, prompt, tool) = target_fields(target);
            tracing::error!(
                parent: ctx.span(),
                system = SYSTEM,
                mcpTransport = ctx.transport().as_str(),
                mcpSessionID = ctx.session_id(),
                mcpRequestID = ctx.request_id(),
                mcpLatency = ?latency,
                mcpMethod = method,
                mcpError = message.as_str(),
                mcpRequest = request_json.as_deref().filter(|_| self.log.request),
                mcpResourceURI = resource,
                mcpPrompt = prompt,
                mcpTool = tool,
                "MCP request error"
            );
        }

        if let Some(metrics) = &self.metrics {
            metrics.observe(method, target.as_str(), Outcome::Error, latency);
        }
    }
}

/// `"MCP <method>"`, followed by the target when there is one.
fn span_name(method: &str, target: Target<'_>) -> String {
    match target {
        Target::None => format!("MCP {method}"),
        _ => format!("MCP {method} {}", target.as_str()),
    }
}

fn record_target(ctx: &RequestContext, target: Target<'_>) {
    match target {
        Target::Resource(uri) => {
            ctx.span().record("mcp.resource", uri);
        }
        Target::Prompt(name) => {
            ctx.span().record("mcp.prompt", name);
        }
        Target::Tool(name) => {
            ctx.span().record("mcp.tool", name);
        }
        Target::None => {}
    }
}

fn target_fields(target: Target<'_>) -> (Option<&str>, Option<&str>, Option<&str>) {
    match target {
        Target::Resource(uri) => (Some(uri), None, None),
        Target::Prompt(name) => (None, Some(name), None),
        Target::Tool(name) => (None, None, Some(name)),
        Target::None => (None, None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TransportKind;
    use mcpmod_core::types::CallToolRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_span_name() {
        assert_eq!(span_name("ping", Target::None), "MCP ping");
        assert_eq!(
            span_name("tools/call", Target::Tool("create-book")),
            "MCP tools/call create-book"
        );
    }

    #[test]
    fn test_target_fields() {
        assert_eq!(
            target_fields(Target::Resource("weather://paris")),
            (Some("weather://paris"), None, None)
        );
        assert_eq!(target_fields(Target::None), (None, None, None));
    }

    #[test]
    fn test_hooks_run_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = Hooks::new();

        let first = Arc::clone(&calls);
        hooks.add_on_success(move |_, _, _, _, _| {
            assert_eq!(first.fetch_add(1, Ordering::SeqCst), 0);
        });
        let second = Arc::clone(&calls);
        hooks.add_on_success(move |_, _, method, _, _| {
            assert_eq!(method, "tools/call");
            assert_eq!(second.fetch_add(1, Ordering::SeqCst), 1);
        });

        let ctx = RequestContext::new("r", "s", TransportKind::Sse);
        let req = ParsedRequest::CallTool(CallToolRequest::new("t", serde_json::json!({})));
        hooks.success(&ctx, &RequestId::Number(1), &req, &Value::Null);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_provider_observes_metrics() {
        let registry = prometheus::Registry::new();
        let metrics = Arc::new(
            RequestMetrics::new(&registry, &crate::config::MetricsConfig::default()).unwrap(),
        );
        let hooks = HooksProvider::new(&ModuleConfig::default(), Some(Arc::clone(&metrics)))
            .provide();

        let ctx = RequestContext::new("r", "", TransportKind::Stdio);
        let req = ParsedRequest::CallTool(CallToolRequest::new("t", serde_json::json!({})));
        hooks.error(&ctx, &RequestId::Number(1), &req, &McpError::internal("boom"));
        hooks.success(&ctx, &RequestId::Number(2), &ParsedRequest::Ping, &Value::Null);

        assert_eq!(metrics.request_count("tools/call", "t", Outcome::Error), 1);
        assert_eq!(metrics.request_count("ping", "", Outcome::Success), 1);
    }
}
