//! Capability providers and the registry that collects them.
//!
//! A provider pairs the metadata a client sees in a `*/list` result with the
//! handler that serves it. Providers are registered by name; registering a
//! second provider under an existing name replaces the first and logs a
//! warning.
//!
//! ```rust
//! use std::sync::Arc;
//! use mcpmod_core::types::{CallToolRequest, CallToolResult, Tool};
//! use mcpmod_server::handler::ToolHandler;
//! use mcpmod_server::registry::{CapabilityRegistry, ToolProvider};
//!
//! struct Ping;
//!
//! impl ToolProvider for Ping {
//!     fn name(&self) -> &str {
//!         "ping"
//!     }
//!     fn options(&self) -> Tool {
//!         Tool::new("ping").description("Answers pong")
//!     }
//!     fn handler(&self) -> ToolHandler {
//!         ToolHandler::new(|_ctx, _req: CallToolRequest| async {
//!             Ok(CallToolResult::text("pong"))
//!         })
//!     }
//! }
//!
//! let registry = CapabilityRegistry::builder().tool(Arc::new(Ping)).build();
//! assert_eq!(registry.info().tools.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use mcpmod_core::types::{Prompt, Resource, ResourceTemplate, Tool};

use crate::engine::McpEngine;
use crate::handler::{PromptHandler, ResourceHandler, ResourceTemplateHandler, ToolHandler};

/// Supplies one tool.
pub trait ToolProvider: Send + Sync {
    /// Registration name.
    fn name(&self) -> &str;
    /// Metadata advertised by `tools/list`.
    fn options(&self) -> Tool;
    /// Handler for `tools/call`.
    fn handler(&self) -> ToolHandler;
}

/// Supplies one prompt.
pub trait PromptProvider: Send + Sync {
    /// Registration name.
    fn name(&self) -> &str;
    /// Metadata advertised by `prompts/list`.
    fn options(&self) -> Prompt;
    /// Handler for `prompts/get`.
    fn handler(&self) -> PromptHandler;
}

/// Supplies one static resource.
pub trait ResourceProvider: Send + Sync {
    /// Registration name.
    fn name(&self) -> &str;
    /// Metadata advertised by `resources/list`.
    fn options(&self) -> Resource;
    /// Handler for `resources/read`.
    fn handler(&self) -> ResourceHandler;
}

/// Supplies one resource template.
pub trait ResourceTemplateProvider: Send + Sync {
    /// Registration name.
    fn name(&self) -> &str;
    /// Metadata advertised by `resources/templates/list`.
    fn options(&self) -> ResourceTemplate;
    /// Handler for `resources/read` on matching URIs.
    fn handler(&self) -> ResourceTemplateHandler;
}

/// One capability, ready to be added to an engine.
#[derive(Debug, Clone)]
pub enum Capability {
    /// A tool.
    Tool(Tool, ToolHandler),
    /// A prompt.
    Prompt(Prompt, PromptHandler),
    /// A static resource.
    Resource(Resource, ResourceHandler),
    /// A resource template.
    ResourceTemplate(ResourceTemplate, ResourceTemplateHandler),
}

/// Name-keyed providers of one kind.
struct CapabilityMap<P: ?Sized> {
    kind: &'static str,
    providers: BTreeMap<String, Arc<P>>,
}

impl<P: ?Sized> CapabilityMap<P> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            providers: BTreeMap::new(),
        }
    }

    fn insert(&mut self, name: &str, provider: Arc<P>) {
        if self.providers.insert(name.to_string(), provider).is_some() {
            tracing::warn!(kind = self.kind, name, "duplicate MCP capability, keeping the last one");
        }
    }

    fn values(&self) -> impl Iterator<Item = &Arc<P>> {
        self.providers.values()
    }
}

/// Every registered provider.
pub struct CapabilityRegistry {
    tools: CapabilityMap<dyn ToolProvider>,
    prompts: CapabilityMap<dyn PromptProvider>,
    resources: CapabilityMap<dyn ResourceProvider>,
    templates: CapabilityMap<dyn ResourceTemplateProvider>,
}

impl CapabilityRegistry {
    /// Build a registry from provider lists.
    pub fn new(
        tools: Vec<Arc<dyn ToolProvider>>,
        prompts: Vec<Arc<dyn PromptProvider>>,
        resources: Vec<Arc<dyn ResourceProvider>>,
        templates: Vec<Arc<dyn ResourceTemplateProvider>>,
    ) -> Self {
        let mut builder = Self::builder();
        for tool in tools {
            builder = builder.tool(tool);
        }
        for prompt in prompts {
            builder = builder.prompt(prompt);
        }
        for resource in resources {
            builder = builder.resource(resource);
        }
        for template in templates {
            builder = builder.resource_template(template);
        }
        builder.build()
    }

    /// Start an empty registry.
    #[must_use]
    pub fn builder() -> CapabilityRegistryBuilder {
        CapabilityRegistryBuilder {
            registry: Self {
                tools: CapabilityMap::new("tool"),
                prompts: CapabilityMap::new("prompt"),
                resources: CapabilityMap::new("resource"),
                templates: CapabilityMap::new("resource template"),
            },
        }
    }

    /// Every capability, resolved from its provider.
    #[must_use]
    pub fn capabilities(&self) -> Vec<Capability> {
        let tools = self
            .tools
            .values()
            .map(|p| Capability::Tool(p.options(), p.handler()));
        let prompts = self
            .prompts
            .values()
            .map(|p| Capability::Prompt(p.options(), p.handler()));
        let resources = self
            .resources
            .values()
            .map(|p| Capability::Resource(p.options(), p.handler()));
        let templates = self
            .templates
            .values()
            .map(|p| Capability::ResourceTemplate(p.options(), p.handler()));

        tools.chain(prompts).chain(resources).chain(templates).collect()
    }

    /// Register every capability on `engine`.
    pub fn bind(&self, engine: &mut McpEngine) {
        for capability in self.capabilities() {
            engine.register(capability);
        }
    }

    /// Registered names and the handler implementing each.
    #[must_use]
    pub fn info(&self) -> RegistryInfo {
        RegistryInfo {
            tools: self
                .tools
                .values()
                .map(|p| (p.name().to_string(), p.handler().identity().to_string()))
                .collect(),
            prompts: self
                .prompts
                .values()
                .map(|p| (p.name().to_string(), p.handler().identity().to_string()))
                .collect(),
            resources: self
                .resources
                .values()
                .map(|p| (p.name().to_string(), p.handler().identity().to_string()))
                .collect(),
            resource_templates: self
                .templates
                .values()
                .map(|p| (p.name().to_string(), p.handler().identity().to_string()))
                .collect(),
        }
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("info", &self.info())
            .finish()
    }
}

/// Incrementally assembles a [`CapabilityRegistry`].
pub struct CapabilityRegistryBuilder {
    registry: CapabilityRegistry,
}

impl CapabilityRegistryBuilder {
    /// Add a tool provider.
    #[must_use]
    pub fn tool(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        let name = provider.name().to_string();
        self.registry.tools.insert(&name, provider);
        self
    }

    /// Add a prompt provider.
    #[must_use]
    pub fn prompt(mut self, provider: Arc<dyn PromptProvider>) -> Self {
        let name = provider.name().to_string();
        self.registry.prompts.insert(&name, provider);
        self
    }

    /// Add a resource provider.
    #[must_use]
    pub fn resource(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        let name = provider.name().to_string();
        self.registry.resources.insert(&name, provider);
        self
    }

    /// Add a resource template provider.
    #[must_use]
    pub fn resource_template(mut self, provider: Arc<dyn ResourceTemplateProvider>) -> Self {
        let name = provider.name().to_string();
        self.registry.templates.insert(&name, provider);
        self
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> CapabilityRegistry {
        self.registry
    }
}

/// Provider names mapped to handler identities, per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryInfo {
    /// Tools.
    pub tools: BTreeMap<String, String>,
    /// Prompts.
    pub prompts: BTreeMap<String, String>,
    /// Static resources.
    pub resources: BTreeMap<String, String>,
    /// Resource templates.
    #[serde(rename = "resourceTemplates")]
    pub resource_templates: BTreeMap<String, String>,
}
