//! Running a module's SSE transport on an ephemeral local port.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use mcpmod_server::{
    CapabilityRegistry, McpModule, ModuleConfig, ModuleOptions, ServerError, SseServer,
};

use crate::client::{ClientError, SseTestClient};

/// A module whose SSE server listens on `127.0.0.1:<random>`.
#[derive(Debug)]
pub struct SseHarness {
    module: McpModule,
    base_url: String,
    server: JoinHandle<Result<(), ServerError>>,
}

impl SseHarness {
    /// Assemble a module and start serving SSE.
    ///
    /// `config.transport.sse.address` is ignored.
    pub async fn start(
        config: ModuleConfig,
        registry: CapabilityRegistry,
        metrics: &prometheus::Registry,
        options: ModuleOptions,
    ) -> Result<Self, ServerError> {
        let module = McpModule::new(config, registry, metrics, options)?;

        let address = "127.0.0.1:0".to_string();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;
        let local = listener.local_addr().map_err(|source| ServerError::Bind {
            address,
            source,
        })?;

        let sse: Arc<SseServer> = module.sse();
        let server = tokio::spawn(async move { sse.serve(listener).await });

        Ok(Self {
            module,
            base_url: format!("http://{local}"),
            server,
        })
    }

    /// The module under test.
    #[must_use]
    pub const fn module(&self) -> &McpModule {
        &self.module
    }

    /// `http://127.0.0.1:<port>`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open a new session.
    pub async fn connect(&self) -> Result<SseTestClient, ClientError> {
        let path = self.module.config().transport.sse.sse_path();
        SseTestClient::connect(&self.base_url, &path).await
    }

    /// Stop the module and wait for the serve loop to return.
    pub async fn stop(self, deadline: Duration) -> Result<(), ServerError> {
        let stopped = self.module.stop(deadline).await;
        match self.server.await {
            Ok(served) => stopped.and(served),
            Err(_) => stopped,
        }
    }
}
