//! Assembly and lifecycle errors.

use std::time::Duration;

use mcpmod_transport::TransportError;
use thiserror::Error;

/// Errors raised while assembling the module or running a transport.
///
/// Request-level failures never surface here; they travel back to the
/// client as JSON-RPC errors.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        /// Path that was read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The SSE listener could not bind its address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// The address that was tried.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The serve loop failed.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// A transport stream failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Metric collectors could not be registered.
    #[error("metrics registration failed: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Graceful shutdown did not finish in time; connections were dropped.
    #[error("graceful shutdown did not complete within {deadline:?}")]
    ShutdownTimeout {
        /// The deadline that elapsed.
        deadline: Duration,
    },
}
