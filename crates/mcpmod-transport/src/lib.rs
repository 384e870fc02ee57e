//! # mcpmod-transport
//!
//! Byte-level plumbing for the two mcpmod transports:
//!
//! - [`stdio`]: newline-delimited JSON framing over any tokio reader/writer
//! - [`sse`]: the session table that routes responses onto open event
//!   streams, the endpoint URL handed to clients, and an incremental event
//!   parser for consumers of the stream
//!
//! The HTTP serving itself lives in `mcpmod-server`, next to the protocol
//! engine it drives.

#![deny(missing_docs)]

pub mod error;
pub mod sse;
pub mod stdio;

pub use error::TransportError;
pub use sse::{SessionRegistry, SseEvent, SseParser, endpoint_url};
pub use stdio::{LineReader, LineWriter, MAX_MESSAGE_SIZE};
