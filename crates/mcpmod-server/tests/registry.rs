//! Capability registration through an assembled module.

use std::sync::Arc;

use serde_json::json;

use mcpmod_core::protocol::Message;
use mcpmod_core::types::CallToolResult;
use mcpmod_server::{
    CapabilityRegistry, McpModule, ModuleConfig, ModuleOptions, RequestContext, TransportKind,
};
use mcpmod_testing::fixtures::call_tool;
use mcpmod_testing::prelude::*;

fn assemble(registry: CapabilityRegistry) -> McpModule {
    McpModule::new(
        ModuleConfig::default(),
        registry,
        &prometheus::Registry::new(),
        ModuleOptions::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_duplicate_tool_name_last_registration_wins() {
    let first = MockTool::new("list-books")
        .handler(|_ctx, _req| async { Ok(CallToolResult::text("first")) })
        .named("h1");
    let second = MockTool::new("list-books")
        .handler(|_ctx, _req| async { Ok(CallToolResult::text("second")) })
        .named("h2");

    let module = assemble(
        CapabilityRegistry::builder()
            .tool(Arc::new(first))
            .tool(Arc::new(second))
            .build(),
    );

    let info = module.info();
    assert_eq!(info.server.tools.len(), 1);
    assert_eq!(info.server.tools["list-books"], "h2");

    let message: Message = serde_json::from_value(call_tool(1, "list-books", json!({}))).unwrap();
    let response = module
        .engine()
        .handle_message(message, RequestContext::new("r", "s", TransportKind::Stdio))
        .await
        .unwrap();
    let result = response.into_result().unwrap();
    assert_eq!(result["content"][0]["text"], "second");
}

#[test]
fn test_info_lists_every_kind() {
    let module = assemble(sample_registry());
    let value = serde_json::to_value(module.info()).unwrap();

    let server = &value["server"];
    assert_eq!(server["tools"].as_object().unwrap().len(), 3);
    assert!(server["prompts"]["greeting"].is_string());
    assert!(server["resources"]["config"].is_string());
    assert!(server["resourceTemplates"]["item"].is_string());
    assert_eq!(server["transport"]["sse"]["status"]["running"], false);
    assert_eq!(server["transport"]["stdio"]["running"], false);
}

#[test]
fn test_distinct_names_one_entry_each() {
    let registry = CapabilityRegistry::builder()
        .tool(Arc::new(MockTool::new("a")))
        .tool(Arc::new(MockTool::new("b")))
        .prompt(Arc::new(MockPrompt::new("a")))
        .build();
    let info = assemble(registry).info();

    assert_eq!(info.server.tools.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(info.server.prompts.keys().collect::<Vec<_>>(), vec!["a"]);
}
