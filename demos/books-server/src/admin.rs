//! Admin endpoints served next to the MCP transports.
//!
//! - `GET /metrics`: Prometheus text exposition
//! - `GET /info`: module introspection

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use prometheus::{Encoder, TextEncoder};
use serde_json::json;

use mcpmod_server::McpModule;

/// What the admin endpoints report on.
#[derive(Debug)]
pub struct AdminState {
    /// Registry holding the request metrics.
    pub metrics: prometheus::Registry,
    /// The running module.
    pub module: Arc<McpModule>,
}

/// Routes for the admin listener.
pub fn router(state: Arc<AdminState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/info", get(info))
        .with_state(state)
}

async fn metrics(State(state): State<Arc<AdminState>>) -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&state.metrics.gather(), &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }
    ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], buffer).into_response()
}

async fn info(State(state): State<Arc<AdminState>>) -> Response {
    let info = state.module.info();
    axum::Json(json!({
        "name": info.name(),
        "info": info,
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpmod_server::{CapabilityRegistry, ModuleConfig, ModuleOptions};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_info_and_metrics_endpoints() {
        let metrics = prometheus::Registry::new();
        let mut config = ModuleConfig::default();
        config.metrics.collect.enabled = true;
        let module = McpModule::new(
            config,
            CapabilityRegistry::builder().build(),
            &metrics,
            ModuleOptions::default(),
        )
        .unwrap();
        module
            .metrics()
            .unwrap()
            .observe("ping", "", mcpmod_server::Outcome::Success, std::time::Duration::ZERO);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::new(AdminState {
            metrics,
            module: Arc::new(module),
        }));
        tokio::spawn(async move { axum::serve(listener, app).await });

        let info: serde_json::Value = reqwest::get(format!("http://{addr}/info"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(info["name"], "mcp");
        assert_eq!(info["info"]["server"]["transport"]["stdio"]["running"], false);

        let body = reqwest::get(format!("http://{addr}/metrics"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("mcp_server_requests_total"));
    }
}
