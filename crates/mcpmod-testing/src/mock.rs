//! Capability providers assembled from closures.
//!
//! ```rust
//! use mcpmod_core::types::CallToolResult;
//! use mcpmod_server::ToolProvider;
//! use mcpmod_testing::mock::MockTool;
//!
//! let tool = MockTool::new("echo")
//!     .description("Echo back the input")
//!     .handler(|_ctx, req| async move {
//!         Ok(CallToolResult::text(req.string_argument("text").unwrap_or_default()))
//!     });
//! assert_eq!(tool.name(), "echo");
//! ```

use std::future::Future;
use std::time::Duration;

use mcpmod_core::error::McpError;
use mcpmod_core::types::{
    CallToolRequest, CallToolResult, GetPromptRequest, GetPromptResult, Prompt, ReadResourceRequest,
    Resource, ResourceContents, ResourceTemplate, Tool,
};
use mcpmod_server::{
    PromptHandler, PromptProvider, RequestContext, ResourceHandler, ResourceProvider,
    ResourceTemplateHandler, ResourceTemplateProvider, ToolHandler, ToolProvider,
};

/// A tool whose behavior is a closure.
#[derive(Debug, Clone)]
pub struct MockTool {
    tool: Tool,
    handler: ToolHandler,
}

impl MockTool {
    /// A tool answering with empty text.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tool: Tool::new(name),
            handler: ToolHandler::new(|_ctx, _req| async { Ok(CallToolResult::text("")) }),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.tool = self.tool.description(description);
        self
    }

    /// Set the handler.
    pub fn handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RequestContext, CallToolRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallToolResult, McpError>> + Send + 'static,
    {
        self.handler = ToolHandler::new(f);
        self
    }

    /// Report the current handler under `identity`.
    pub fn named(mut self, identity: &'static str) -> Self {
        self.handler = self.handler.named(identity);
        self
    }

    /// Always fail with an internal error carrying `message`.
    pub fn returns_error(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.handler(move |_ctx, _req| {
            let message = message.clone();
            async move { Err(McpError::internal(message)) }
        })
    }

    /// Sleep for `delay`, then answer `"done"`.
    pub fn sleeps(self, delay: Duration) -> Self {
        self.handler(move |_ctx, _req| async move {
            tokio::time::sleep(delay).await;
            Ok(CallToolResult::text("done"))
        })
    }
}

impl ToolProvider for MockTool {
    fn name(&self) -> &str {
        &self.tool.name
    }

    fn options(&self) -> Tool {
        self.tool.clone()
    }

    fn handler(&self) -> ToolHandler {
        self.handler.clone()
    }
}

/// A prompt whose behavior is a closure.
#[derive(Debug, Clone)]
pub struct MockPrompt {
    prompt: Prompt,
    handler: PromptHandler,
}

impl MockPrompt {
    /// A prompt answering with no messages.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            prompt: Prompt::new(name),
            handler: PromptHandler::new(|_ctx, _req| async {
                Ok(GetPromptResult::messages(Vec::new()))
            }),
        }
    }

    /// Declare a required argument.
    pub fn required_arg(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.prompt = self.prompt.required_arg(name, description);
        self
    }

    /// Set the handler.
    pub fn handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RequestContext, GetPromptRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GetPromptResult, McpError>> + Send + 'static,
    {
        self.handler = PromptHandler::new(f);
        self
    }
}

impl PromptProvider for MockPrompt {
    fn name(&self) -> &str {
        &self.prompt.name
    }

    fn options(&self) -> Prompt {
        self.prompt.clone()
    }

    fn handler(&self) -> PromptHandler {
        self.handler.clone()
    }
}

/// A static resource serving fixed text.
#[derive(Debug, Clone)]
pub struct MockResource {
    name: String,
    resource: Resource,
    handler: ResourceHandler,
}

impl MockResource {
    /// Serve `text` as `text/plain` under `uri`.
    #[must_use]
    pub fn text(name: impl Into<String>, uri: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        let uri = uri.into();
        let text = text.into();
        let resource = Resource::new(uri.clone(), name.clone()).mime_type("text/plain");
        let handler = ResourceHandler::new(move |_ctx, _req: ReadResourceRequest| {
            let contents = ResourceContents::text(uri.clone(), "text/plain", text.clone());
            async move { Ok(vec![contents]) }
        });
        Self {
            name,
            resource,
            handler,
        }
    }
}

impl ResourceProvider for MockResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> Resource {
        self.resource.clone()
    }

    fn handler(&self) -> ResourceHandler {
        self.handler.clone()
    }
}

/// A resource template echoing its captured placeholders.
#[derive(Debug, Clone)]
pub struct MockResourceTemplate {
    name: String,
    template: ResourceTemplate,
    handler: ResourceTemplateHandler,
}

impl MockResourceTemplate {
    /// Answer reads matching `uri_template` with the captured arguments as
    /// JSON.
    #[must_use]
    pub fn echo(name: impl Into<String>, uri_template: impl Into<String>) -> Self {
        let name = name.into();
        let template = ResourceTemplate::new(uri_template, name.clone()).mime_type("application/json");
        let handler = ResourceTemplateHandler::new(|_ctx, req: ReadResourceRequest| async move {
            let arguments = req.arguments.clone().unwrap_or_default();
            ResourceContents::json(req.uri, &arguments)
                .map(|contents| vec![contents])
                .map_err(|e| McpError::internal_with_source("failed to encode arguments", e))
        });
        Self {
            name,
            template,
            handler,
        }
    }
}

impl ResourceTemplateProvider for MockResourceTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> ResourceTemplate {
        self.template.clone()
    }

    fn handler(&self) -> ResourceTemplateHandler {
        self.handler.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpmod_server::TransportKind;

    fn ctx() -> RequestContext {
        RequestContext::new("r", "s", TransportKind::Stdio)
    }

    #[tokio::test]
    async fn test_failing_tool() {
        let tool = MockTool::new("fail").returns_error("boom");
        let err = ToolProvider::handler(&tool)
            .call(ctx(), CallToolRequest::new("fail", serde_json::json!({})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_template_echoes_arguments() {
        let template = MockResourceTemplate::echo("item", "test://items/{id}");
        let mut req = ReadResourceRequest::new("test://items/7");
        req.arguments = template.options().match_uri(&req.uri);

        let contents = template.handler().call(ctx(), req).await.unwrap();
        let value: serde_json::Value =
            serde_json::from_str(contents[0].as_text().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"id": "7"}));
    }
}
