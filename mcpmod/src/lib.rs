//! # mcpmod
//!
//! An instrumented MCP server module.
//!
//! Declare tools, prompts, resources and resource templates as providers,
//! hand them to an [`McpModule`] together with a [`ModuleConfig`], and serve
//! them over SSE, stdio or both. Every request gets a root span, one log
//! record and, when enabled, Prometheus request metrics.
//!
//! # Crates
//!
//! - [`protocol`]: protocol and capability types
//! - [`transport`]: stdio framing and SSE plumbing
//! - [`server`]: engine, registry, hooks, transports and module assembly
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mcpmod::prelude::*;
//!
//! struct ListBooks;
//!
//! impl ToolProvider for ListBooks {
//!     fn name(&self) -> &str {
//!         "list-books"
//!     }
//!
//!     fn options(&self) -> Tool {
//!         Tool::new("list-books").description("List the books")
//!     }
//!
//!     fn handler(&self) -> ToolHandler {
//!         ToolHandler::new(|_ctx, _req| async { Ok(CallToolResult::text("[]")) })
//!     }
//! }
//!
//! let registry = CapabilityRegistry::builder().tool(Arc::new(ListBooks)).build();
//! let module = McpModule::new(
//!     ModuleConfig::default(),
//!     registry,
//!     &prometheus::Registry::new(),
//!     ModuleOptions::default(),
//! )?;
//! assert!(module.info().server.tools.contains_key("list-books"));
//! # Ok::<(), ServerError>(())
//! ```

#![deny(missing_docs)]

pub use mcpmod_core::{JsonRpcError, McpError, Message, Request, RequestId, Response};
pub use mcpmod_server::{
    CapabilityRegistry, Hooks, HooksProvider, McpModule, ModuleConfig, ModuleInfo, ModuleOptions,
    RequestContext, ServerError, TransportKind,
};

pub mod prelude;

/// Core module re-exports
pub mod protocol {
    //! Protocol and capability types.
    pub use mcpmod_core::*;
}

/// Transport module re-exports
pub mod transport {
    //! Transport codecs.
    pub use mcpmod_transport::*;
}

/// Server module re-exports
pub mod server {
    //! Server implementation types.
    pub use mcpmod_server::*;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;
        let _ = std::any::type_name::<McpError>();
        let config = ModuleConfig::default();
        assert!(config.capabilities.tools);
    }
}
