//! # mcpmod-core
//!
//! Protocol and capability types shared by the mcpmod crates.
//!
//! - **Protocol types**: JSON-RPC 2.0 request/response/notification envelopes
//! - **MCP types**: tools, prompts, resources, resource templates, content
//! - **Capability negotiation**: server capabilities and `initialize` payloads
//! - **Error handling**: unified `McpError` with JSON-RPC code mapping
//!
//! This crate has no async runtime dependency.
//!
//! # Example
//!
//! ```rust
//! use mcpmod_core::{
//!     capability::{ServerCapabilities, ServerInfo},
//!     types::Tool,
//! };
//!
//! let tool = Tool::new("list-books")
//!     .description("List the books of the library")
//!     .with_string_param("genre", "Filter by genre", false);
//!
//! let caps = ServerCapabilities::new().with_tools().with_prompts();
//! let info = ServerInfo::new("books", "1.0.0");
//! assert_eq!(tool.name, "list-books");
//! assert!(caps.has_tools());
//! assert_eq!(info.name, "books");
//! ```

#![deny(missing_docs)]

pub mod capability;
pub mod error;
pub mod protocol;
pub mod types;

pub use capability::{
    ClientInfo, InitializeRequest, InitializeResult, PROTOCOL_VERSION, ServerCapabilities,
    ServerInfo, negotiate_version,
};
pub use error::{JsonRpcError, McpError, McpResultExt};
pub use protocol::{Message, Notification, Request, RequestId, Response};
