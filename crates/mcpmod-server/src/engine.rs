//! The protocol engine.
//!
//! [`McpEngine`] owns the capability tables and turns one decoded JSON-RPC
//! message into at most one response. It knows nothing about transports:
//! the SSE and stdio servers hand it a message plus a [`RequestContext`]
//! and deliver whatever comes back.
//!
//! # Example
//!
//! ```rust
//! use mcpmod_core::capability::{ServerCapabilities, ServerInfo};
//! use mcpmod_core::protocol::{Message, Request};
//! use mcpmod_server::context::{RequestContext, TransportKind};
//! use mcpmod_server::engine::McpEngine;
//!
//! # tokio_test::block_on(async {
//! let engine = McpEngine::new(
//!     ServerInfo::new("demo", "1.0.0"),
//!     ServerCapabilities::new().with_tools(),
//!     None,
//! );
//!
//! let ctx = RequestContext::new("r1", "", TransportKind::Stdio);
//! let response = engine
//!     .handle_message(Message::Request(Request::new("ping", 1u64)), ctx)
//!     .await
//!     .unwrap();
//! assert!(response.is_success());
//! # });
//! ```

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::RwLock;

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;

use mcpmod_core::capability::{
    InitializeResult, ServerCapabilities, ServerInfo, negotiate_version,
};
use mcpmod_core::error::{JsonRpcError, McpError};
use mcpmod_core::protocol::{Message, Notification, Request, Response};
use mcpmod_core::types::{
    CallToolRequest, GetPromptRequest, ListPromptsResult, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, LoggingLevel, Prompt, ReadResourceRequest,
    ReadResourceResult, Resource, ResourceTemplate, Tool,
};

use crate::context::RequestContext;
use crate::handler::{PromptHandler, ResourceHandler, ResourceTemplateHandler, ToolHandler};
use crate::hooks::Hooks;
use crate::registry::Capability;
use crate::router::{ParsedRequest, methods, notifications, parse_request};

/// Dispatches MCP requests to registered capabilities.
pub struct McpEngine {
    server_info: ServerInfo,
    capabilities: ServerCapabilities,
    instructions: Option<String>,
    tools: HashMap<String, (Tool, ToolHandler)>,
    prompts: HashMap<String, (Prompt, PromptHandler)>,
    resources: HashMap<String, (Resource, ResourceHandler)>,
    templates: HashMap<String, (ResourceTemplate, ResourceTemplateHandler)>,
    hooks: Hooks,
    log_level: RwLock<LoggingLevel>,
}

impl McpEngine {
    /// Create an engine with no capabilities registered.
    #[must_use]
    pub fn new(
        server_info: ServerInfo,
        capabilities: ServerCapabilities,
        instructions: Option<String>,
    ) -> Self {
        Self {
            server_info,
            capabilities,
            instructions,
            tools: HashMap::new(),
            prompts: HashMap::new(),
            resources: HashMap::new(),
            templates: HashMap::new(),
            hooks: Hooks::new(),
            log_level: RwLock::new(LoggingLevel::Info),
        }
    }

    /// Replace the hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// The hooks in use.
    #[must_use]
    pub const fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// The advertised capabilities.
    #[must_use]
    pub const fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// The level last set by a client through `logging/setLevel`.
    ///
    /// The level is only recorded: the server sends no `notifications/message`
    /// to clients, so nothing is filtered by it. Server-side logs follow the
    /// host's `tracing` filter.
    #[must_use]
    pub fn log_level(&self) -> LoggingLevel {
        *self.log_level.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn add_tool(&mut self, tool: Tool, handler: ToolHandler) {
        self.tools.insert(tool.name.clone(), (tool, handler));
    }

    /// Register a prompt, replacing any prompt with the same name.
    pub fn add_prompt(&mut self, prompt: Prompt, handler: PromptHandler) {
        self.prompts.insert(prompt.name.clone(), (prompt, handler));
    }

    /// Register a static resource, replacing any resource with the same URI.
    pub fn add_resource(&mut self, resource: Resource, handler: ResourceHandler) {
        self.resources
            .insert(resource.uri.clone(), (resource, handler));
    }

    /// Register a resource template, replacing any template with the same
    /// pattern.
    pub fn add_resource_template(
        &mut self,
        template: ResourceTemplate,
        handler: ResourceTemplateHandler,
    ) {
        self.templates
            .insert(template.uri_template.clone(), (template, handler));
    }

    /// Register any kind of capability.
    pub fn register(&mut self, capability: Capability) {
        match capability {
            Capability::Tool(tool, handler) => self.add_tool(tool, handler),
            Capability::Prompt(prompt, handler) => self.add_prompt(prompt, handler),
            Capability::Resource(resource, handler) => self.add_resource(resource, handler),
            Capability::ResourceTemplate(template, handler) => {
                self.add_resource_template(template, handler);
            }
        }
    }

    /// Fire the session registration hooks.
    pub fn register_session(&self, ctx: &RequestContext, session_id: &str) {
        self.hooks.register_session(ctx, session_id);
    }

    /// Handle one incoming message.
    ///
    /// Requests always produce a response. Notifications and stray
    /// responses produce none.
    pub async fn handle_message(&self, message: Message, ctx: RequestContext) -> Option<Response> {
        match message {
            Message::Request(request) => Some(self.handle_request(request, ctx).await),
            Message::Notification(notification) => {
                self.handle_notification(&notification, &ctx);
                None
            }
            Message::Response(response) => {
                tracing::debug!(
                    parent: ctx.span(),
                    id = ?response.id,
                    "ignoring response sent to the server"
                );
                None
            }
        }
    }

    fn handle_notification(&self, notification: &Notification, ctx: &RequestContext) {
        if notification.method() == notifications::INITIALIZED {
            tracing::debug!(parent: ctx.span(), "MCP client initialized");
        } else {
            tracing::debug!(
                parent: ctx.span(),
                method = notification.method(),
                "ignoring unsupported notification"
            );
        }
    }

    /// Handle one request; hooks fire exactly once, on success or error.
    pub async fn handle_request(&self, request: Request, ctx: RequestContext) -> Response {
        let id = request.id.clone();

        let (parsed, outcome) = match parse_request(&request) {
            Ok(parsed) => {
                self.hooks.before_any(&ctx, &id, &parsed);
                let outcome = self.dispatch_guarded(&parsed, &ctx).await;
                (parsed, outcome)
            }
            Err(err) => {
                let parsed = ParsedRequest::Unparsed {
                    method: request.method.to_string(),
                    params: request.params,
                };
                (parsed, Err(err))
            }
        };

        match outcome {
            Ok(result) => {
                self.hooks.success(&ctx, &id, &parsed, &result);
                Response::success(id, result)
            }
            Err(err) => {
                self.hooks.error(&ctx, &id, &parsed, &err);
                Response::error(id, JsonRpcError::from(&err))
            }
        }
    }

    async fn dispatch_guarded(
        &self,
        req: &ParsedRequest,
        ctx: &RequestContext,
    ) -> Result<Value, McpError> {
        match AssertUnwindSafe(self.dispatch(req, ctx)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => Err(McpError::internal(format!(
                "panic recovered in {} handler",
                req.method()
            ))),
        }
    }

    async fn dispatch(&self, req: &ParsedRequest, ctx: &RequestContext) -> Result<Value, McpError> {
        match req {
            ParsedRequest::Initialize(init) => {
                let mut result =
                    InitializeResult::new(self.server_info.clone(), self.capabilities.clone());
                result.protocol_version = negotiate_version(&init.protocol_version).to_string();
                if let Some(instructions) = &self.instructions {
                    result = result.instructions(instructions.clone());
                }
                to_value(&result)
            }
            ParsedRequest::Ping => Ok(Value::Object(serde_json::Map::new())),
            ParsedRequest::ListTools(_) => {
                self.require(self.capabilities.has_tools(), req)?;
                let mut tools: Vec<Tool> = self.tools.values().map(|(t, _)| t.clone()).collect();
                tools.sort_by(|a, b| a.name.cmp(&b.name));
                to_value(&ListToolsResult {
                    tools,
                    next_cursor: None,
                })
            }
            ParsedRequest::CallTool(call) => {
                self.require(self.capabilities.has_tools(), req)?;
                self.call_tool(call, ctx).await
            }
            ParsedRequest::ListPrompts(_) => {
                self.require(self.capabilities.has_prompts(), req)?;
                let mut prompts: Vec<Prompt> =
                    self.prompts.values().map(|(p, _)| p.clone()).collect();
                prompts.sort_by(|a, b| a.name.cmp(&b.name));
                to_value(&ListPromptsResult {
                    prompts,
                    next_cursor: None,
                })
            }
            ParsedRequest::GetPrompt(get) => {
                self.require(self.capabilities.has_prompts(), req)?;
                self.get_prompt(get, ctx).await
            }
            ParsedRequest::ListResources(_) => {
                self.require(self.capabilities.has_resources(), req)?;
                let mut resources: Vec<Resource> =
                    self.resources.values().map(|(r, _)| r.clone()).collect();
                resources.sort_by(|a, b| a.name.cmp(&b.name));
                to_value(&ListResourcesResult {
                    resources,
                    next_cursor: None,
                })
            }
            ParsedRequest::ReadResource(read) => {
                self.require(self.capabilities.has_resources(), req)?;
                self.read_resource(read, ctx).await
            }
            ParsedRequest::ListResourceTemplates(_) => {
                self.require(self.capabilities.has_resources(), req)?;
                let mut resource_templates: Vec<ResourceTemplate> =
                    self.templates.values().map(|(t, _)| t.clone()).collect();
                resource_templates.sort_by(|a, b| a.name.cmp(&b.name));
                to_value(&ListResourceTemplatesResult {
                    resource_templates,
                    next_cursor: None,
                })
            }
            ParsedRequest::SetLevel(set) => {
                self.require(self.capabilities.has_logging(), req)?;
                *self.log_level.write().unwrap_or_else(|e| e.into_inner()) = set.level;
                tracing::debug!(parent: ctx.span(), level = ?set.level, "MCP client log level recorded");
                Ok(Value::Object(serde_json::Map::new()))
            }
            ParsedRequest::Unparsed { method, .. } => Err(McpError::method_not_found(method)),
        }
    }

    /// Methods of a disabled capability behave as unknown methods.
    fn require(&self, enabled: bool, req: &ParsedRequest) -> Result<(), McpError> {
        if enabled {
            Ok(())
        } else {
            Err(McpError::method_not_found(req.method()))
        }
    }

    async fn call_tool(&self, call: &CallToolRequest, ctx: &RequestContext) -> Result<Value, McpError> {
        let Some((_, handler)) = self.tools.get(&call.name) else {
            return Err(McpError::invalid_params(
                methods::TOOLS_CALL,
                format!("Unknown tool: {}", call.name),
            ));
        };
        let result = handler.call(ctx.clone(), call.clone()).await?;
        to_value(&result)
    }

    async fn get_prompt(&self, get: &GetPromptRequest, ctx: &RequestContext) -> Result<Value, McpError> {
        let Some((_, handler)) = self.prompts.get(&get.name) else {
            return Err(McpError::invalid_params(
                methods::PROMPTS_GET,
                format!("Unknown prompt: {}", get.name),
            ));
        };
        let result = handler.call(ctx.clone(), get.clone()).await?;
        to_value(&result)
    }

    async fn read_resource(
        &self,
        read: &ReadResourceRequest,
        ctx: &RequestContext,
    ) -> Result<Value, McpError> {
        if let Some((_, handler)) = self.resources.get(&read.uri) {
            let contents = handler.call(ctx.clone(), read.clone()).await?;
            return to_value(&ReadResourceResult { contents });
        }

        let mut patterns: Vec<&String> = self.templates.keys().collect();
        patterns.sort();
        for pattern in patterns {
            let Some((template, handler)) = self.templates.get(pattern) else {
                continue;
            };
            if let Some(arguments) = template.match_uri(&read.uri) {
                let mut request = read.clone();
                request.arguments = Some(arguments);
                let contents = handler.call(ctx.clone(), request).await?;
                return to_value(&ReadResourceResult { contents });
            }
        }

        Err(McpError::resource_not_found(&read.uri))
    }
}

impl std::fmt::Debug for McpEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpEngine")
            .field("server_info", &self.server_info)
            .field("tools", &self.tools.len())
            .field("prompts", &self.prompts.len())
            .field("resources", &self.resources.len())
            .field("templates", &self.templates.len())
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, McpError> {
    serde_json::to_value(value)
        .map_err(|e| McpError::internal_with_source("failed to serialize result", e))
}
