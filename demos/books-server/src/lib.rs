//! A books library served as an MCP server.
//!
//! Three tools manage the books (`list-books`, `create-book`,
//! `delete-book`), a prompt greets the owner, a resource reports the weather
//! and a resource template searches books by title.

pub mod admin;
pub mod config;
pub mod domain;
pub mod error;
pub mod mcp;

use std::future::Future;
use std::sync::Arc;

use mcpmod_server::{McpModule, ModuleOptions};
use tokio::task::JoinHandle;

pub use config::{AppConfig, BooksConfig};
pub use error::Error;

use crate::domain::{BookRepository, BookService};

/// Assemble the MCP module for `config`, registering request metrics on
/// `metrics`.
pub fn build_module(config: &AppConfig, metrics: &prometheus::Registry) -> Result<McpModule, Error> {
    let service = Arc::new(BookService::new(BookRepository::new()));
    let registry = mcp::registry(&config.app, &service, reqwest::Client::new());

    Ok(McpModule::new(
        config.mcp.clone(),
        registry,
        metrics,
        ModuleOptions::default(),
    )?)
}

/// Why the server is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The shutdown signal fired.
    Signal,
    /// Every exposed MCP transport returned, e.g. stdin closed.
    TransportsExited,
}

/// Wait for `signal` or for every MCP transport in `transports` to return.
///
/// Only the MCP transports count: the admin listener never keeps the
/// process alive on its own. With no transport exposed only `signal` ends
/// the wait.
pub async fn wait_for_shutdown(
    transports: Vec<JoinHandle<()>>,
    signal: impl Future<Output = ()>,
) -> Shutdown {
    let transports_done = async {
        if transports.is_empty() {
            std::future::pending::<()>().await;
        }
        futures::future::join_all(transports).await;
    };

    tokio::select! {
        () = signal => Shutdown::Signal,
        () = transports_done => Shutdown::TransportsExited,
    }
}
