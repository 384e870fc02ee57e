//! Transport servers driving the engine.

pub mod sse;
pub mod stdio;

use serde::Serialize;

pub use sse::{SseInfoConfig, SseServer, SseServerInfo};
pub use stdio::StdioServer;

/// Whether a transport is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    /// `true` between start and stop.
    pub running: bool,
}
