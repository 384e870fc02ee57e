//! A minimal MCP client speaking the SSE transport.
//!
//! [`SseTestClient::connect`] opens the event stream and waits for the
//! `endpoint` event; [`post`](SseTestClient::post) submits messages to it and
//! [`next_message`](SseTestClient::next_message) returns the next `message`
//! event, decoded.

use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use mcpmod_transport::SseParser;
use mcpmod_transport::sse::{ENDPOINT_EVENT, MESSAGE_EVENT};

/// How long the client waits for any single event.
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised by [`SseTestClient`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// The HTTP exchange failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// An event carried invalid JSON.
    #[error("invalid message: {0}")]
    Json(#[from] serde_json::Error),

    /// The stream ended.
    #[error("event stream closed")]
    Closed,

    /// No event arrived in time.
    #[error("no event within {0:?}")]
    Timeout(Duration),

    /// The first event was not the endpoint announcement.
    #[error("expected endpoint event, got {0:?}")]
    UnexpectedEvent(Option<String>),
}

/// A connected SSE session.
#[derive(Debug)]
pub struct SseTestClient {
    http: reqwest::Client,
    endpoint: String,
    request_id: Option<String>,
    events: mpsc::UnboundedReceiver<mcpmod_transport::SseEvent>,
    reader: JoinHandle<()>,
    timeout: Duration,
}

impl SseTestClient {
    /// Open `{base_url}{sse_path}` and wait for the message endpoint.
    pub async fn connect(base_url: &str, sse_path: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::new();
        let response = http
            .get(format!("{base_url}{sse_path}"))
            .send()
            .await?
            .error_for_status()?;
        let request_id = header(&response, "x-request-id");

        let (tx, mut events) = mpsc::unbounded_channel();
        let reader = tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut parser = SseParser::new();
            while let Some(Ok(chunk)) = body.next().await {
                for event in parser.push(&String::from_utf8_lossy(&chunk)) {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
            }
        });

        let first = tokio::time::timeout(DEFAULT_EVENT_TIMEOUT, events.recv())
            .await
            .map_err(|_| ClientError::Timeout(DEFAULT_EVENT_TIMEOUT))?
            .ok_or(ClientError::Closed)?;
        if first.event.as_deref() != Some(ENDPOINT_EVENT) {
            return Err(ClientError::UnexpectedEvent(first.event));
        }

        let endpoint = if first.data.starts_with("http") {
            first.data
        } else {
            format!("{base_url}{}", first.data)
        };

        Ok(Self {
            http,
            endpoint,
            request_id,
            events,
            reader,
            timeout: DEFAULT_EVENT_TIMEOUT,
        })
    }

    /// Change how long [`next_message`](Self::next_message) waits.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The absolute URL messages are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The session id taken from the endpoint.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.endpoint
            .split_once("sessionId=")
            .map(|(_, id)| id.split('&').next().unwrap_or(id))
    }

    /// The `X-Request-Id` the stream was opened with.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Post a message.
    pub async fn post(&self, message: &Value) -> Result<reqwest::Response, ClientError> {
        Ok(self.http.post(&self.endpoint).json(message).send().await?)
    }

    /// Post a message with an explicit `X-Request-Id`.
    pub async fn post_with_request_id(
        &self,
        message: &Value,
        request_id: &str,
    ) -> Result<reqwest::Response, ClientError> {
        Ok(self
            .http
            .post(&self.endpoint)
            .header("x-request-id", request_id)
            .json(message)
            .send()
            .await?)
    }

    /// Post a raw body.
    pub async fn post_raw(&self, body: &str) -> Result<reqwest::Response, ClientError> {
        Ok(self
            .http
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await?)
    }

    /// The next `message` event, decoded.
    pub async fn next_message(&mut self) -> Result<Value, ClientError> {
        loop {
            let event = tokio::time::timeout(self.timeout, self.events.recv())
                .await
                .map_err(|_| ClientError::Timeout(self.timeout))?
                .ok_or(ClientError::Closed)?;
            if event.event.as_deref() == Some(MESSAGE_EVENT) {
                return Ok(serde_json::from_str(&event.data)?);
            }
        }
    }

    /// Post a request and wait for the response with the same id.
    pub async fn request(&mut self, message: &Value) -> Result<Value, ClientError> {
        self.post(message).await?.error_for_status()?;
        loop {
            let response = self.next_message().await?;
            if response.get("id") == message.get("id") {
                return Ok(response);
            }
        }
    }

    /// Whether the server ended the stream.
    pub async fn wait_closed(&mut self) -> Result<(), ClientError> {
        loop {
            match tokio::time::timeout(self.timeout, self.events.recv()).await {
                Ok(Some(_)) => {}
                Ok(None) => return Ok(()),
                Err(_) => return Err(ClientError::Timeout(self.timeout)),
            }
        }
    }
}

impl Drop for SseTestClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn header(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
