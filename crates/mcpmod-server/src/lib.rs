//! Instrumented MCP server runtime.
//!
//! This crate turns a set of capability providers into a running MCP server
//! reachable over SSE, stdio or both, with every request traced, logged and
//! counted the same way.
//!
//! # Overview
//!
//! 1. Implement [`ToolProvider`], [`PromptProvider`], [`ResourceProvider`]
//!    or [`ResourceTemplateProvider`] for each capability
//! 2. Collect them in a [`CapabilityRegistry`]
//! 3. Load a [`ModuleConfig`]
//! 4. Assemble an [`McpModule`] and start it
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mcpmod_core::types::{GetPromptRequest, GetPromptResult, Prompt, PromptMessage};
//! use mcpmod_server::{
//!     CapabilityRegistry, McpModule, ModuleConfig, ModuleOptions, PromptHandler, PromptProvider,
//! };
//!
//! struct Greet;
//!
//! impl PromptProvider for Greet {
//!     fn name(&self) -> &str {
//!         "greet"
//!     }
//!
//!     fn options(&self) -> Prompt {
//!         Prompt::new("greet").required_arg("name", "Who to greet")
//!     }
//!
//!     fn handler(&self) -> PromptHandler {
//!         PromptHandler::new(|_ctx, req: GetPromptRequest| async move {
//!             let name = req.argument("name").unwrap_or("stranger").to_string();
//!             Ok(GetPromptResult::messages(vec![PromptMessage::assistant(format!("Hello, {name}!"))]))
//!         })
//!     }
//! }
//!
//! let registry = CapabilityRegistry::builder().prompt(Arc::new(Greet)).build();
//! let module = McpModule::new(
//!     ModuleConfig::default(),
//!     registry,
//!     &prometheus::Registry::new(),
//!     ModuleOptions::default(),
//! )
//! .unwrap();
//!
//! assert!(module.info().server.prompts.contains_key("greet"));
//! ```
//!
//! # Observability
//!
//! Each request gets a root span named `MCP` that is renamed on completion
//! to `MCP <method>[ <target>]`, one log record (`MCP request success` or
//! `MCP request error`) and, when enabled, a Prometheus counter increment
//! and latency observation. See [`hooks`] and [`metrics`].

#![deny(missing_docs)]

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod handler;
pub mod hooks;
pub mod info;
pub mod metrics;
pub mod module;
pub mod propagation;
pub mod registry;
pub mod router;
#[cfg(feature = "otel")]
pub mod telemetry;
pub mod transport;

pub use config::ModuleConfig;
pub use context::{RequestContext, TransportKind};
pub use engine::McpEngine;
pub use error::ServerError;
pub use handler::{Handler, PromptHandler, ResourceHandler, ResourceTemplateHandler, ToolHandler};
pub use hooks::{Hooks, HooksProvider};
pub use info::ModuleInfo;
pub use metrics::{Outcome, RequestMetrics};
pub use module::{McpModule, ModuleOptions};
pub use propagation::{
    DefaultSseContextHandler, DefaultStdioContextHandler, IdGenerator, SseContextHandler,
    StdioContextHandler, UuidGenerator,
};
pub use registry::{
    Capability, CapabilityRegistry, PromptProvider, RegistryInfo, ResourceProvider,
    ResourceTemplateProvider, ToolProvider,
};
pub use router::{ParsedRequest, Target};
pub use transport::{SseServer, StdioServer};

#[cfg(feature = "otel")]
pub use telemetry::{TracingGuard, init_tracing_with_otel};
