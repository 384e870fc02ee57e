//! HTTP server speaking MCP over Server-Sent Events.
//!
//! - `GET {base_path}{sse_endpoint}` opens a session and streams events
//! - `POST {base_path}{message_endpoint}?sessionId=...` submits a message
//!
//! A submitted request is acknowledged with `202 Accepted` straight away;
//! its response arrives later as a `message` event on the session stream.

use std::convert::Infallible;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use mcpmod_core::protocol::{self, Message};
use mcpmod_transport::SessionRegistry;
use mcpmod_transport::sse::{ENDPOINT_EVENT, MESSAGE_EVENT, endpoint_url};

use crate::config::SseConfig;
use crate::engine::McpEngine;
use crate::error::ServerError;
use crate::propagation::{REQUEST_ID_HEADER, SseContextHandler};
use crate::transport::ServerStatus;

struct Shared {
    config: SseConfig,
    engine: Arc<McpEngine>,
    contexts: Arc<dyn SseContextHandler>,
    sessions: SessionRegistry,
    tracker: TaskTracker,
}

/// The SSE transport server.
///
/// A server runs once: after [`stop`](Self::stop) it cannot be started
/// again.
pub struct SseServer {
    shared: Arc<Shared>,
    running: AtomicBool,
    shutdown: CancellationToken,
    force: CancellationToken,
    finished: watch::Sender<bool>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl SseServer {
    /// Create a server dispatching to `engine`.
    pub fn new(
        config: SseConfig,
        engine: Arc<McpEngine>,
        contexts: Arc<dyn SseContextHandler>,
    ) -> Self {
        let (finished, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                config,
                engine,
                contexts,
                sessions: SessionRegistry::new(),
                tracker: TaskTracker::new(),
            }),
            running: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            force: CancellationToken::new(),
            finished,
            local_addr: Mutex::new(None),
        }
    }

    /// The axum router serving both endpoints.
    pub fn router(&self) -> Router {
        let config = &self.shared.config;
        Router::new()
            .route(&config.sse_path(), get(handle_sse))
            .route(&config.message_path(), post(handle_message))
            .with_state(Arc::clone(&self.shared))
    }

    /// Bind the configured address and serve until stopped.
    pub async fn start(&self) -> Result<(), ServerError> {
        let address = self.shared.config.bind_address();
        self.running.store(true, Ordering::Release);
        tracing::info!(address = %address, "starting MCP SSE server");

        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(source) => {
                self.running.store(false, Ordering::Release);
                tracing::error!(address = %address, error = %source, "MCP SSE server bind failed");
                return Err(ServerError::Bind { address, source });
            }
        };

        self.serve(listener).await
    }

    /// Serve on an already bound listener until stopped.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        self.running.store(true, Ordering::Release);
        if let Ok(addr) = listener.local_addr() {
            *self.local_addr.lock().unwrap_or_else(|e| e.into_inner()) = Some(addr);
        }

        let app = self.router();
        let shutdown = self.shutdown.clone();

        let result = tokio::select! {
            result = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .into_future() => result.map_err(ServerError::Serve),
            () = self.force.cancelled() => {
                tracing::warn!("MCP SSE server connections force closed");
                Ok(())
            }
        };

        if let Err(e) = &result {
            tracing::error!(error = %e, "MCP SSE server error");
        }

        self.running.store(false, Ordering::Release);
        self.finished.send_replace(true);
        result
    }

    /// Stop accepting work and wait, up to `deadline`, for in-flight calls
    /// to finish and streams to close.
    ///
    /// When the deadline passes, remaining connections are dropped and
    /// [`ServerError::ShutdownTimeout`] is returned. The server reports not
    /// running afterwards in both cases.
    pub async fn stop(&self, deadline: Duration) -> Result<(), ServerError> {
        self.shared.tracker.close();
        self.shutdown.cancel();

        if !self.running.load(Ordering::Acquire) {
            self.shared.sessions.close_all();
            return Ok(());
        }

        tracing::info!(deadline = ?deadline, "stopping MCP SSE server");

        let mut finished = self.finished.subscribe();
        let graceful = async {
            self.shared.tracker.wait().await;
            self.shared.sessions.close_all();
            // the sender lives in self, so this only ends once serve returns
            let _ = finished.wait_for(|done| *done).await;
        };

        let outcome = match tokio::time::timeout(deadline, graceful).await {
            Ok(()) => Ok(()),
            Err(_) => {
                self.force.cancel();
                self.shared.sessions.close_all();
                Err(ServerError::ShutdownTimeout { deadline })
            }
        };

        self.running.store(false, Ordering::Release);
        outcome
    }

    /// Whether the server is serving.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The bound address, once serving.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of open event streams.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.shared.sessions.len()
    }

    /// Configuration and status for introspection.
    #[must_use]
    pub fn info(&self) -> SseServerInfo {
        let config = &self.shared.config;
        SseServerInfo {
            config: SseInfoConfig {
                address: config.address.clone(),
                base_url: config.base_url.clone(),
                base_path: config.base_path.clone(),
                sse_endpoint: config.sse_endpoint.clone(),
                message_endpoint: config.message_endpoint.clone(),
                keep_alive: config.keep_alive,
                keep_alive_interval: config.keep_alive_interval().as_secs_f64(),
            },
            status: ServerStatus {
                running: self.is_running(),
            },
        }
    }
}

impl std::fmt::Debug for SseServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseServer")
            .field("config", &self.shared.config)
            .field("running", &self.is_running())
            .field("local_addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}

/// SSE server introspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SseServerInfo {
    /// Effective configuration.
    pub config: SseInfoConfig,
    /// Current status.
    pub status: ServerStatus,
}

/// Configuration part of [`SseServerInfo`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SseInfoConfig {
    /// Listen address.
    pub address: String,
    /// Advertised base URL.
    pub base_url: String,
    /// Path prefix.
    pub base_path: String,
    /// Event stream path.
    pub sse_endpoint: String,
    /// Message path.
    pub message_endpoint: String,
    /// Keep-alive enabled.
    pub keep_alive: bool,
    /// Keep-alive interval in seconds.
    pub keep_alive_interval: f64,
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

async fn handle_sse(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> Response {
    let session_id = uuid::Uuid::new_v4().to_string();
    let ctx = shared.contexts.derive(&session_id, &headers);
    let rx = shared.sessions.open(session_id.clone());
    shared.engine.register_session(&ctx, &session_id);

    let config = &shared.config;
    let endpoint = endpoint_url(
        &config.base_url,
        &config.base_path,
        &config.message_endpoint,
        &session_id,
    );
    let keep_alive = config.keep_alive.then(|| config.keep_alive_interval());

    let sse = Sse::new(session_stream(Arc::clone(&shared), session_id, endpoint, rx));
    let response = match keep_alive {
        Some(interval) => sse
            .keep_alive(KeepAlive::new().interval(interval))
            .into_response(),
        None => sse.into_response(),
    };
    with_request_id(response, ctx.request_id())
}

/// Removes the session when the client goes away.
struct SessionGuard {
    shared: Arc<Shared>,
    session_id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.shared.sessions.close(&self.session_id);
        tracing::debug!(session_id = %self.session_id, "MCP SSE session closed");
    }
}

fn session_stream(
    shared: Arc<Shared>,
    session_id: String,
    endpoint: String,
    mut rx: mpsc::UnboundedReceiver<String>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let _guard = SessionGuard { shared, session_id };

        yield Ok(Event::default().event(ENDPOINT_EVENT).data(endpoint));

        while let Some(payload) = rx.recv().await {
            yield Ok(Event::default().event(MESSAGE_EVENT).data(payload));
        }
    }
}

async fn handle_message(
    State(shared): State<Arc<Shared>>,
    Query(query): Query<MessageQuery>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let session_id = query.session_id.unwrap_or_default();
    let ctx = shared.contexts.derive(&session_id, &headers);
    let request_id = ctx.request_id().to_string();

    if session_id.is_empty() {
        return with_request_id(
            (StatusCode::BAD_REQUEST, "Missing sessionId").into_response(),
            &request_id,
        );
    }

    if !shared.sessions.contains(&session_id) {
        return with_request_id(
            (StatusCode::NOT_FOUND, "Invalid session ID").into_response(),
            &request_id,
        );
    }

    let message: Message = match serde_json::from_str(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(parent: ctx.span(), error = %e, "invalid MCP message");
            let response = protocol::Response::parse_error(e.to_string());
            return with_request_id(
                (StatusCode::BAD_REQUEST, axum::Json(response)).into_response(),
                &request_id,
            );
        }
    };

    let task = Arc::clone(&shared);
    shared.tracker.spawn(async move {
        let Some(response) = task.engine.handle_message(message, ctx).await else {
            return;
        };
        match serde_json::to_string(&response) {
            Ok(payload) => {
                if let Err(e) = task.sessions.send(&session_id, payload) {
                    tracing::warn!(session_id = %session_id, error = %e, "dropping MCP response");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize MCP response");
            }
        }
    });

    with_request_id(StatusCode::ACCEPTED.into_response(), &request_id)
}

fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::DefaultSseContextHandler;
    use mcpmod_core::capability::{ServerCapabilities, ServerInfo};

    fn server(config: SseConfig) -> SseServer {
        let engine = Arc::new(McpEngine::new(
            ServerInfo::new("t", "1"),
            ServerCapabilities::new(),
            None,
        ));
        SseServer::new(config, engine, Arc::new(DefaultSseContextHandler::default()))
    }

    #[test]
    fn test_info_reflects_config() {
        let info = server(SseConfig {
            keep_alive_interval: 3,
            ..SseConfig::default()
        })
        .info();

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["config"]["address"], ":8082");
        assert_eq!(value["config"]["sse_endpoint"], "/sse");
        assert_eq!(value["config"]["keep_alive_interval"], 3.0);
        assert_eq!(value["status"]["running"], false);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_ok() {
        let server = server(SseConfig::default());
        server.stop(Duration::from_millis(10)).await.unwrap();
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = taken.local_addr().unwrap().to_string();

        let server = server(SseConfig {
            address,
            ..SseConfig::default()
        });
        let err = server.start().await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
        assert!(!server.is_running());
    }
}
