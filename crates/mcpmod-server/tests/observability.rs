//! Hooks pipeline tests.
//!
//! Requests are fed straight into the engine of an assembled module; spans
//! and log records are captured on the test thread.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use mcpmod_core::protocol::{Message, Response};
use mcpmod_server::{
    CapabilityRegistry, Hooks, McpModule, ModuleConfig, ModuleOptions, Outcome, RequestContext,
    TransportKind,
};
use mcpmod_testing::fixtures::{SLOW_TOOL_DELAY, call_tool, get_prompt, read_resource, request};
use mcpmod_testing::prelude::*;

fn module(config: ModuleConfig, options: ModuleOptions) -> McpModule {
    McpModule::new(
        config,
        sample_registry(),
        &prometheus::Registry::new(),
        options,
    )
    .unwrap()
}

async fn send(module: &McpModule, message: Value) -> Option<Response> {
    let message: Message = serde_json::from_value(message).unwrap();
    let ctx = RequestContext::new("req-1", "session-1", TransportKind::Sse);
    module.engine().handle_message(message, ctx).await
}

fn metrics_config() -> ModuleConfig {
    let mut config = ModuleConfig::default();
    config.metrics.collect.enabled = true;
    config
}

// =============================================================================
// Exactly one outcome hook per call
// =============================================================================

#[derive(Debug, Default)]
struct Outcomes {
    success: Vec<(String, Duration)>,
    error: Vec<(String, Duration)>,
}

fn counting_hooks() -> (Hooks, Arc<Mutex<Outcomes>>) {
    let outcomes = Arc::new(Mutex::new(Outcomes::default()));
    let mut hooks = Hooks::new();

    let seen = Arc::clone(&outcomes);
    hooks.add_on_success(move |ctx, _id, method, _req, _result| {
        seen.lock()
            .unwrap()
            .success
            .push((method.to_string(), ctx.elapsed()));
    });
    let seen = Arc::clone(&outcomes);
    hooks.add_on_error(move |ctx, _id, method, _req, _err| {
        seen.lock()
            .unwrap()
            .error
            .push((method.to_string(), ctx.elapsed()));
    });

    (hooks, outcomes)
}

#[tokio::test]
async fn test_one_outcome_hook_per_call() {
    let (hooks, outcomes) = counting_hooks();
    let module = module(
        ModuleConfig::default(),
        ModuleOptions {
            hooks,
            ..ModuleOptions::default()
        },
    );

    let calls = vec![
        request(1, "ping", json!({})),
        call_tool(2, "echo", json!({"text": "hi"})),
        call_tool(3, "fail", json!({})),
        call_tool(4, "missing", json!({})),
        request(5, "no/such/method", json!({})),
        request(6, "tools/call", json!({"arguments": 12})),
        read_resource(7, "test://items/9"),
    ];
    let total = calls.len();
    for call in calls {
        assert!(send(&module, call).await.is_some());
    }

    let notification = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
    assert!(send(&module, notification).await.is_none());

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.success.len(), 3);
    assert_eq!(outcomes.error.len(), 4);
    assert_eq!(outcomes.success.len() + outcomes.error.len(), total);
}

#[tokio::test]
async fn test_latency_spans_the_handler() {
    let (hooks, outcomes) = counting_hooks();
    let module = module(
        ModuleConfig::default(),
        ModuleOptions {
            hooks,
            ..ModuleOptions::default()
        },
    );

    send(&module, call_tool(1, "slow", json!({}))).await;

    let outcomes = outcomes.lock().unwrap();
    let (method, latency) = &outcomes.success[0];
    assert_eq!(method, "tools/call");
    assert!(*latency >= SLOW_TOOL_DELAY);
}

// =============================================================================
// Target labels
// =============================================================================

#[tokio::test]
async fn test_target_labels() {
    let module = module(metrics_config(), ModuleOptions::default());
    let metrics = module.metrics().unwrap();

    send(&module, call_tool(1, "echo", json!({"text": "x"}))).await;
    send(&module, get_prompt(2, "greeting", json!({"name": "Ada"}))).await;
    send(&module, read_resource(3, "test://config")).await;
    send(&module, request(4, "tools/list", json!({}))).await;

    assert_eq!(metrics.request_count("tools/call", "echo", Outcome::Success), 1);
    assert_eq!(metrics.request_count("prompts/get", "greeting", Outcome::Success), 1);
    assert_eq!(
        metrics.request_count("resources/read", "test://config", Outcome::Success),
        1
    );
    assert_eq!(metrics.request_count("tools/list", "", Outcome::Success), 1);
    assert_eq!(metrics.sample_count("tools/call", "echo"), 1);
}

#[tokio::test]
async fn test_span_name_carries_target() {
    let capture = Capture::new();
    let _guard = capture.install();
    let module = module(ModuleConfig::default(), ModuleOptions::default());

    send(&module, call_tool(1, "echo", json!({"text": "x"}))).await;
    send(&module, request(2, "ping", json!({}))).await;

    let call = &capture.spans_named("MCP tools/call echo")[0];
    assert_eq!(call.field("mcp.tool"), Some("echo"));
    assert_eq!(call.field("mcp.method"), Some("tools/call"));
    assert_eq!(call.field("otel.status_code"), Some("ok"));
    assert_eq!(call.field("system"), Some("mcpserver"));

    let ping = &capture.spans_named("MCP ping")[0];
    assert_eq!(ping.field("mcp.tool"), None);
}

// =============================================================================
// Payload flags
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    TraceRequest,
    TraceResponse,
    LogRequest,
    LogResponse,
}

#[tokio::test]
async fn test_payload_flags_are_independent() {
    let flags = [
        Flag::TraceRequest,
        Flag::TraceResponse,
        Flag::LogRequest,
        Flag::LogResponse,
    ];

    for flag in flags {
        let mut config = ModuleConfig::default();
        match flag {
            Flag::TraceRequest => config.trace.request = true,
            Flag::TraceResponse => config.trace.response = true,
            Flag::LogRequest => config.log.request = true,
            Flag::LogResponse => config.log.response = true,
        }

        let capture = Capture::new();
        let _guard = capture.install();
        let module = module(config, ModuleOptions::default());
        send(&module, call_tool(1, "echo", json!({"text": "payload"}))).await;

        let span = &capture.spans_named("MCP tools/call echo")[0];
        let event = &capture.events_with_message("MCP request success")[0];

        assert_eq!(
            span.field("mcp.request").is_some(),
            flag == Flag::TraceRequest,
            "{flag:?}"
        );
        assert_eq!(
            span.field("mcp.response").is_some(),
            flag == Flag::TraceResponse,
            "{flag:?}"
        );
        assert_eq!(
            event.field("mcpRequest").is_some(),
            flag == Flag::LogRequest,
            "{flag:?}"
        );
        assert_eq!(
            event.field("mcpResponse").is_some(),
            flag == Flag::LogResponse,
            "{flag:?}"
        );
    }
}

#[tokio::test]
async fn test_request_payload_content() {
    let mut config = ModuleConfig::default();
    config.log.request = true;
    config.log.response = true;

    let capture = Capture::new();
    let _guard = capture.install();
    let module = module(config, ModuleOptions::default());
    send(&module, call_tool(1, "echo", json!({"text": "payload"}))).await;

    let event = &capture.events_with_message("MCP request success")[0];
    let logged: Value = serde_json::from_str(event.field("mcpRequest").unwrap()).unwrap();
    assert_eq!(logged["name"], "echo");
    assert_eq!(logged["arguments"]["text"], "payload");
    assert!(event.field("mcpResponse").unwrap().contains("payload"));
}

// =============================================================================
// Exclusion lists
// =============================================================================

#[tokio::test]
async fn test_trace_exclusion_covers_both_paths() {
    let mut config = ModuleConfig::default();
    config.trace.exclude = vec!["tools/call".to_string()];

    let capture = Capture::new();
    let _guard = capture.install();
    let module = module(config, ModuleOptions::default());

    send(&module, call_tool(1, "echo", json!({"text": "x"}))).await;
    send(&module, call_tool(2, "fail", json!({}))).await;
    send(&module, request(3, "ping", json!({}))).await;

    assert!(capture.spans_named("MCP tools/call echo").is_empty());
    assert!(capture.spans_named("MCP tools/call fail").is_empty());
    assert!(
        capture
            .spans()
            .iter()
            .filter(|span| span.name == "MCP")
            .all(|span| span.field("mcp.method") != Some("tools/call"))
    );
    assert_eq!(capture.spans_named("MCP ping").len(), 1);

    // logging is unaffected
    assert_eq!(capture.events_with_message("MCP request error").len(), 1);
    assert_eq!(capture.events_with_message("MCP request success").len(), 2);
}

#[tokio::test]
async fn test_log_exclusion_covers_both_paths() {
    let mut config = ModuleConfig::default();
    config.log.exclude = vec!["tools/call".to_string()];

    let capture = Capture::new();
    let _guard = capture.install();
    let module = module(config, ModuleOptions::default());

    send(&module, call_tool(1, "echo", json!({"text": "x"}))).await;
    send(&module, call_tool(2, "fail", json!({}))).await;
    send(&module, request(3, "ping", json!({}))).await;

    assert!(capture.events_with_message("MCP request error").is_empty());
    let success = capture.events_with_message("MCP request success");
    assert_eq!(success.len(), 1);
    assert_eq!(success[0].field("mcpMethod"), Some("ping"));

    // tracing is unaffected
    assert_eq!(capture.spans_named("MCP tools/call echo").len(), 1);
    assert_eq!(capture.spans_named("MCP tools/call fail").len(), 1);
}

// =============================================================================
// Failing tool call
// =============================================================================

#[tokio::test]
async fn test_failing_create_book_is_reported_once() {
    let capture = Capture::new();
    let _guard = capture.install();

    let failures = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = Hooks::new();
    let seen = Arc::clone(&failures);
    hooks.add_on_error(move |_ctx, _id, method, req, err| {
        seen.lock().unwrap().push((
            method.to_string(),
            req.target().as_str().to_string(),
            err.to_string(),
        ));
    });

    let registry = CapabilityRegistry::builder()
        .tool(Arc::new(
            MockTool::new("create-book").returns_error("database unavailable"),
        ))
        .build();
    let module = McpModule::new(
        metrics_config(),
        registry,
        &prometheus::Registry::new(),
        ModuleOptions {
            hooks,
            ..ModuleOptions::default()
        },
    )
    .unwrap();
    let metrics = module.metrics().unwrap();

    let response = send(&module, call_tool(1, "create-book", json!({"title": "Dune"})))
        .await
        .unwrap();
    let error = response.into_result().unwrap_err();
    assert_eq!(error.code, -32603);

    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    let (method, target, message) = &failures[0];
    assert_eq!(method, "tools/call");
    assert_eq!(target, "create-book");
    assert!(message.contains("database unavailable"));

    let event = &capture.events_with_message("MCP request error")[0];
    assert_eq!(event.level, tracing::Level::ERROR);
    assert_eq!(event.field("mcpMethod"), Some("tools/call"));
    assert_eq!(event.field("mcpTool"), Some("create-book"));
    assert!(event.field("mcpError").unwrap().contains("database unavailable"));

    let span = &capture.spans_named("MCP tools/call create-book")[0];
    assert_eq!(span.field("otel.status_code"), Some("error"));
    assert!(
        span.field("otel.status_message")
            .unwrap()
            .contains("database unavailable")
    );

    assert_eq!(
        metrics.request_count("tools/call", "create-book", Outcome::Error),
        1
    );
    assert_eq!(
        metrics.request_count("tools/call", "create-book", Outcome::Success),
        0
    );
}

#[tokio::test]
async fn test_log_record_identifies_request() {
    let capture = Capture::new();
    let _guard = capture.install();
    let module = module(ModuleConfig::default(), ModuleOptions::default());

    send(&module, read_resource(1, "test://config")).await;

    let event = &capture.events_with_message("MCP request success")[0];
    assert_eq!(event.field("system"), Some("mcpserver"));
    assert_eq!(event.field("mcpTransport"), Some("sse"));
    assert_eq!(event.field("mcpSessionID"), Some("session-1"));
    assert_eq!(event.field("mcpRequestID"), Some("req-1"));
    assert_eq!(event.field("mcpResourceURI"), Some("test://config"));
    assert!(event.field("mcpLatency").is_some());
    assert_eq!(
        capture.event_span(event).unwrap().display_name(),
        "MCP resources/read test://config"
    );
}
