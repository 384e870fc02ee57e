//! Pre-built fixtures for common test scenarios.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{Value, json};

use mcpmod_core::types::{CallToolResult, GetPromptResult, PromptMessage};
use mcpmod_server::{CapabilityRegistry, IdGenerator};

use crate::mock::{MockPrompt, MockResource, MockResourceTemplate, MockTool};

/// How long the `slow` sample tool sleeps.
pub const SLOW_TOOL_DELAY: Duration = Duration::from_millis(300);

/// A registry holding one of each capability kind.
///
/// - tool `echo`: answers with its `text` argument
/// - tool `fail`: always fails with `"tool failed"`
/// - tool `slow`: sleeps [`SLOW_TOOL_DELAY`], then answers `"done"`
/// - prompt `greeting`: requires `name`
/// - resource `config` at `test://config`
/// - resource template `item` matching `test://items/{id}`
#[must_use]
pub fn sample_registry() -> CapabilityRegistry {
    CapabilityRegistry::builder()
        .tool(Arc::new(
            MockTool::new("echo")
                .description("Echo back the input")
                .handler(|_ctx, req| async move {
                    Ok(CallToolResult::text(
                        req.string_argument("text").unwrap_or_default(),
                    ))
                }),
        ))
        .tool(Arc::new(
            MockTool::new("fail")
                .description("Always fails")
                .returns_error("tool failed"),
        ))
        .tool(Arc::new(
            MockTool::new("slow")
                .description("Takes its time")
                .sleeps(SLOW_TOOL_DELAY),
        ))
        .prompt(Arc::new(
            MockPrompt::new("greeting")
                .required_arg("name", "Who to greet")
                .handler(|_ctx, req| async move {
                    let name = req.argument("name").unwrap_or("stranger").to_string();
                    Ok(GetPromptResult::messages(vec![PromptMessage::assistant(
                        format!("Hello, {name}!"),
                    )]))
                }),
        ))
        .resource(Arc::new(MockResource::text(
            "config",
            "test://config",
            "debug=true",
        )))
        .resource_template(Arc::new(MockResourceTemplate::echo(
            "item",
            "test://items/{id}",
        )))
        .build()
}

/// Always hands out the same id.
#[derive(Debug, Clone)]
pub struct FixedIdGenerator(pub String);

impl IdGenerator for FixedIdGenerator {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

/// Hands out `{prefix}-1`, `{prefix}-2`, ...
#[derive(Debug)]
pub struct SequenceIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequenceIdGenerator {
    /// Start counting at one.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}

/// A JSON-RPC request.
#[must_use]
pub fn request(id: i64, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

/// A `tools/call` request.
#[must_use]
pub fn call_tool(id: i64, name: &str, arguments: Value) -> Value {
    request(id, "tools/call", json!({"name": name, "arguments": arguments}))
}

/// A `prompts/get` request.
#[must_use]
pub fn get_prompt(id: i64, name: &str, arguments: Value) -> Value {
    request(id, "prompts/get", json!({"name": name, "arguments": arguments}))
}

/// A `resources/read` request.
#[must_use]
pub fn read_resource(id: i64, uri: &str) -> Value {
    request(id, "resources/read", json!({"uri": uri}))
}
