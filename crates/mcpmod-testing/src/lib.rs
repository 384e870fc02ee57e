//! Testing utilities for mcpmod.
//!
//! # Overview
//!
//! - [`mock`]: capability providers built from closures
//! - [`fixtures`]: a sample registry, id generators and request builders
//! - [`capture`]: records spans and log records for assertions
//! - [`client`]: an SSE client for end-to-end tests
//! - [`harness`]: runs a module's SSE server on an ephemeral port
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use mcpmod_server::{ModuleConfig, ModuleOptions};
//! use mcpmod_testing::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let capture = Capture::new();
//! let _guard = capture.install();
//!
//! let harness = SseHarness::start(
//!     ModuleConfig::default(),
//!     sample_registry(),
//!     &prometheus::Registry::new(),
//!     ModuleOptions::default(),
//! )
//! .await?;
//!
//! let mut client = harness.connect().await?;
//! let response = client.request(&call_tool(1, "echo", serde_json::json!({"text": "hi"}))).await?;
//! assert_eq!(response["result"]["content"][0]["text"], "hi");
//! assert_eq!(capture.spans_named("MCP tools/call echo").len(), 1);
//!
//! harness.stop(Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod capture;
pub mod client;
pub mod fixtures;
pub mod harness;
pub mod mock;

pub use capture::{Capture, CaptureLayer, CapturedEvent, CapturedSpan};
pub use client::{ClientError, SseTestClient};
pub use fixtures::{FixedIdGenerator, SequenceIdGenerator, sample_registry};
pub use harness::SseHarness;
pub use mock::{MockPrompt, MockResource, MockResourceTemplate, MockTool};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::capture::{Capture, CapturedEvent, CapturedSpan};
    pub use crate::client::SseTestClient;
    pub use crate::fixtures::{
        FixedIdGenerator, SequenceIdGenerator, call_tool, get_prompt, read_resource, request,
        sample_registry,
    };
    pub use crate::harness::SseHarness;
    pub use crate::mock::{MockPrompt, MockResource, MockResourceTemplate, MockTool};
}
