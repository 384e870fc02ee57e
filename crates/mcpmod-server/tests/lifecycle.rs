//! Transport lifecycle tests: graceful and forced SSE shutdown, stdio
//! serving over in-memory pipes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tokio::io::AsyncReadExt;

use mcpmod_server::{CapabilityRegistry, McpModule, ModuleConfig, ModuleOptions, ServerError};
use mcpmod_testing::fixtures::{call_tool, request};
use mcpmod_testing::prelude::*;

async fn harness_with_slow_tool(delay: Duration) -> SseHarness {
    let registry = CapabilityRegistry::builder()
        .tool(Arc::new(MockTool::new("slow-call").sleeps(delay)))
        .build();
    SseHarness::start(
        ModuleConfig::default(),
        registry,
        &prometheus::Registry::new(),
        ModuleOptions::default(),
    )
    .await
    .unwrap()
}

// =============================================================================
// SSE shutdown
// =============================================================================

#[tokio::test]
async fn test_stop_waits_for_in_flight_call() {
    let harness = harness_with_slow_tool(Duration::from_secs(1)).await;
    let sse = harness.module().sse();
    let mut client = harness.connect().await.unwrap();

    let accepted = client
        .post(&call_tool(1, "slow-call", json!({})))
        .await
        .unwrap();
    assert_eq!(accepted.status(), reqwest::StatusCode::ACCEPTED);

    let started = Instant::now();
    harness.stop(Duration::from_secs(5)).await.unwrap();
    let waited = started.elapsed();

    assert!(waited >= Duration::from_millis(500), "stopped after {waited:?}");
    assert!(waited < Duration::from_secs(5), "stopped after {waited:?}");
    assert!(!sse.is_running());
    assert_eq!(sse.session_count(), 0);

    let reply = client.next_message().await.unwrap();
    assert_eq!(reply["id"], 1);
    assert_eq!(reply["result"]["content"][0]["text"], "done");
    client.wait_closed().await.unwrap();
}

#[tokio::test]
async fn test_stop_deadline_forces_shutdown() {
    let harness = harness_with_slow_tool(Duration::from_secs(3)).await;
    let sse = harness.module().sse();
    let client = harness.connect().await.unwrap();

    client
        .post(&call_tool(1, "slow-call", json!({})))
        .await
        .unwrap();

    let err = harness
        .stop(Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::ShutdownTimeout { .. }));
    assert!(!sse.is_running());
}

#[tokio::test]
async fn test_stop_with_idle_session() {
    let harness = harness_with_slow_tool(Duration::from_millis(10)).await;
    let sse = harness.module().sse();
    let _client = harness.connect().await.unwrap();

    harness.stop(Duration::from_secs(5)).await.unwrap();

    assert!(!sse.is_running());
    let info = serde_json::to_value(sse.info()).unwrap();
    assert_eq!(info["status"]["running"], false);
}

// =============================================================================
// Stdio
// =============================================================================

fn lines(messages: &[Value]) -> Vec<u8> {
    let mut input = Vec::new();
    for message in messages {
        input.extend_from_slice(message.to_string().as_bytes());
        input.push(b'\n');
    }
    input
}

#[tokio::test]
async fn test_stdio_round_trip() {
    let capture = Capture::new();
    let _guard = capture.install();

    let module = McpModule::new(
        ModuleConfig::default(),
        sample_registry(),
        &prometheus::Registry::new(),
        ModuleOptions::default(),
    )
    .unwrap();

    let mut input = lines(&[
        request(1, "ping", json!({})),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        call_tool(2, "echo", json!({"text": "over stdio"})),
        call_tool(3, "fail", json!({})),
    ]);
    input.extend_from_slice(b"garbage\n");

    let (writer, mut output) = tokio::io::duplex(64 * 1024);
    module
        .stdio()
        .serve(input.as_slice(), writer)
        .await
        .unwrap();
    assert!(!module.stdio().is_running());

    let mut written = String::new();
    output.read_to_string(&mut written).await.unwrap();
    let mut responses: Vec<Value> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    responses.sort_by_key(|response| response["id"].as_i64().unwrap_or(0));

    assert_eq!(responses.len(), 4);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[1]["result"], json!({}));
    assert_eq!(responses[2]["result"]["content"][0]["text"], "over stdio");
    assert_eq!(responses[3]["error"]["code"], -32603);

    let logged = capture.events_with_message("MCP request success");
    assert_eq!(logged.len(), 2);
    assert!(
        logged
            .iter()
            .all(|event| event.field("mcpTransport") == Some("stdio"))
    );
    assert_eq!(capture.events_with_message("MCP request error").len(), 1);
}

#[tokio::test]
async fn test_stdio_drains_slow_calls_at_end_of_input() {
    let registry = CapabilityRegistry::builder()
        .tool(Arc::new(
            MockTool::new("slow-call").sleeps(Duration::from_millis(200)),
        ))
        .build();
    let module = McpModule::new(
        ModuleConfig::default(),
        registry,
        &prometheus::Registry::new(),
        ModuleOptions::default(),
    )
    .unwrap();

    let input = lines(&[call_tool(1, "slow-call", json!({}))]);
    let (writer, mut output) = tokio::io::duplex(64 * 1024);
    module
        .stdio()
        .serve(input.as_slice(), writer)
        .await
        .unwrap();

    let mut written = String::new();
    output.read_to_string(&mut written).await.unwrap();
    let response: Value = serde_json::from_str(written.trim()).unwrap();
    assert_eq!(response["result"]["content"][0]["text"], "done");
}
