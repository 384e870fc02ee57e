//! Error handling for mcpmod.
//!
//! Every protocol-visible failure is an [`McpError`]. Its [`McpError::code`]
//! picks the JSON-RPC code and [`JsonRpcError`] is the wire object the
//! engine puts into the error envelope. Capability handlers return
//! `Result<T, McpError>`; the dispatch hooks see the same value the client
//! does.

mod jsonrpc;
mod mcp;

pub use jsonrpc::JsonRpcError;
pub use mcp::{McpError, McpResultExt};

/// JSON-RPC error codes used on the wire.
pub mod codes {
    /// The payload is not valid JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// The method is not served.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// The params do not match the method, or name an unknown tool or prompt.
    pub const INVALID_PARAMS: i32 = -32602;
    /// A handler or the server itself failed.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// No resource or template matches the URI.
    pub const RESOURCE_NOT_FOUND: i32 = -32002;
    /// The transport carrying the request failed.
    pub const TRANSPORT_ERROR: i32 = -32000;
}
