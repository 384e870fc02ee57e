//! Wiring configuration, capabilities and transports into one unit.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use mcpmod_server::config::ModuleConfig;
//! use mcpmod_server::module::{McpModule, ModuleOptions};
//! use mcpmod_server::registry::CapabilityRegistry;
//!
//! # async fn run() -> Result<(), mcpmod_server::error::ServerError> {
//! let config = ModuleConfig::from_file("config.toml")?;
//! let metrics = prometheus::Registry::new();
//! let module = McpModule::new(
//!     config,
//!     CapabilityRegistry::builder().build(),
//!     &metrics,
//!     ModuleOptions::default(),
//! )?;
//!
//! let tasks = module.start();
//! tokio::signal::ctrl_c().await.ok();
//! module.stop(Duration::from_secs(5)).await?;
//! # drop(tasks);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use mcpmod_core::capability::{ServerCapabilities, ServerInfo};

use crate::config::ModuleConfig;
use crate::engine::McpEngine;
use crate::error::ServerError;
use crate::hooks::{Hooks, HooksProvider};
use crate::info::ModuleInfo;
use crate::metrics::RequestMetrics;
use crate::propagation::{
    DefaultSseContextHandler, DefaultStdioContextHandler, SseContextHandler, StdioContextHandler,
};
use crate::registry::CapabilityRegistry;
use crate::transport::{SseServer, StdioServer};

/// Optional collaborators for [`McpModule::new`].
pub struct ModuleOptions {
    /// Context derivation for SSE requests.
    pub sse_contexts: Arc<dyn SseContextHandler>,
    /// Context derivation for stdio requests.
    pub stdio_contexts: Arc<dyn StdioContextHandler>,
    /// Hooks run after the built-in instrumentation.
    pub hooks: Hooks,
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self {
            sse_contexts: Arc::new(DefaultSseContextHandler::default()),
            stdio_contexts: Arc::new(DefaultStdioContextHandler::default()),
            hooks: Hooks::new(),
        }
    }
}

/// An assembled MCP server: engine, capabilities and both transports.
pub struct McpModule {
    config: ModuleConfig,
    registry: CapabilityRegistry,
    engine: Arc<McpEngine>,
    metrics: Option<Arc<RequestMetrics>>,
    sse: Arc<SseServer>,
    stdio: Arc<StdioServer>,
}

impl McpModule {
    /// Build the engine, bind every capability and prepare the transports.
    ///
    /// Fails when `config` does not validate, or when request metrics are
    /// enabled but cannot be registered on `metrics_registry`.
    pub fn new(
        config: ModuleConfig,
        registry: CapabilityRegistry,
        metrics_registry: &prometheus::Registry,
        options: ModuleOptions,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        let metrics = if config.metrics.collect.enabled {
            Some(Arc::new(RequestMetrics::new(
                metrics_registry,
                &config.metrics,
            )?))
        } else {
            None
        };

        let mut hooks = HooksProvider::new(&config, metrics.clone()).provide();
        hooks.merge(options.hooks);

        let mut engine = McpEngine::new(
            ServerInfo::new(&config.name, &config.version),
            capabilities(&config),
            config.instructions().map(str::to_string),
        )
        .with_hooks(hooks);
        registry.bind(&mut engine);
        let engine = Arc::new(engine);

        let sse = Arc::new(SseServer::new(
            config.transport.sse.clone(),
            Arc::clone(&engine),
            options.sse_contexts,
        ));
        let stdio = Arc::new(StdioServer::new(Arc::clone(&engine), options.stdio_contexts));

        Ok(Self {
            config,
            registry,
            engine,
            metrics,
            sse,
            stdio,
        })
    }

    /// Spawn every exposed transport.
    ///
    /// Failures are logged; the returned handles complete when each
    /// transport stops.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();

        if self.config.transport.sse.expose {
            let sse = Arc::clone(&self.sse);
            tasks.push(tokio::spawn(async move {
                if let Err(e) = sse.start().await {
                    tracing::error!(error = %e, "failed to start MCP SSE server");
                }
            }));
        }

        if self.config.transport.stdio.expose {
            let stdio = Arc::clone(&self.stdio);
            tasks.push(tokio::spawn(async move {
                if let Err(e) = stdio.start().await {
                    tracing::error!(error = %e, "failed to start MCP Stdio server");
                }
            }));
        }

        tasks
    }

    /// Gracefully stop the SSE transport.
    pub async fn stop(&self, deadline: Duration) -> Result<(), ServerError> {
        self.sse.stop(deadline).await
    }

    /// Introspection snapshot.
    #[must_use]
    pub fn info(&self) -> ModuleInfo {
        ModuleInfo::new(self.sse.info(), self.stdio.info(), self.registry.info())
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// The shared protocol engine.
    #[must_use]
    pub fn engine(&self) -> Arc<McpEngine> {
        Arc::clone(&self.engine)
    }

    /// Request metrics, when enabled.
    #[must_use]
    pub fn metrics(&self) -> Option<Arc<RequestMetrics>> {
        self.metrics.clone()
    }

    /// The SSE server.
    #[must_use]
    pub fn sse(&self) -> Arc<SseServer> {
        Arc::clone(&self.sse)
    }

    /// The stdio server.
    #[must_use]
    pub fn stdio(&self) -> Arc<StdioServer> {
        Arc::clone(&self.stdio)
    }
}

impl std::fmt::Debug for McpModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpModule")
            .field("name", &self.config.name)
            .field("sse", &self.sse)
            .field("stdio", &self.stdio)
            .finish_non_exhaustive()
    }
}

fn capabilities(config: &ModuleConfig) -> ServerCapabilities {
    let toggles = config.capabilities;
    let mut capabilities = ServerCapabilities::new();
    if toggles.tools {
        capabilities = capabilities.with_tools();
    }
    if toggles.prompts {
        capabilities = capabilities.with_prompts();
    }
    if toggles.resources {
        capabilities = capabilities.with_resources(true, true);
    }
    if toggles.logging {
        capabilities = capabilities.with_logging();
    }
    capabilities
}
