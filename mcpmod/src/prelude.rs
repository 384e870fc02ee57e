//! Prelude module for convenient imports.
//!
//! ```rust
//! use mcpmod::prelude::*;
//!
//! let config = ModuleConfig::default();
//! let tool = Tool::new("list-books").description("List the books");
//! let result = CallToolResult::text("[]");
//! assert_eq!(config.transport.sse.sse_endpoint, "/sse");
//! assert_eq!(tool.name, "list-books");
//! assert!(!result.is_error());
//! ```
//!
//! ## Included Types
//!
//! - Protocol and error types (`Message`, `Response`, `McpError`)
//! - Capability declarations and results (`Tool`, `CallToolResult`, ...)
//! - Provider traits and their handler types
//! - Module assembly (`McpModule`, `ModuleConfig`, `CapabilityRegistry`)

// Core types
pub use mcpmod_core::types::{
    CallToolRequest, CallToolResult, Content, GetPromptRequest, GetPromptResult, Prompt,
    PromptArgument, PromptMessage, ReadResourceRequest, Resource, ResourceContents,
    ResourceTemplate, Role, Tool, ToolAnnotations,
};
pub use mcpmod_core::{JsonRpcError, McpError, Message, Request, RequestId, Response};

// Server types
pub use mcpmod_server::{
    CapabilityRegistry, Hooks, McpModule, ModuleConfig, ModuleInfo, ModuleOptions,
    PromptHandler, PromptProvider, RequestContext, ResourceHandler, ResourceProvider,
    ResourceTemplateHandler, ResourceTemplateProvider, ServerError, ToolHandler, ToolProvider,
    TransportKind,
};
