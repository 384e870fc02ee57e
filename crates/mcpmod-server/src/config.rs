//! Module configuration.
//!
//! Every section is optional in the source document; missing keys take the
//! defaults below.
//!
//! ```
//! use mcpmod_server::config::ModuleConfig;
//!
//! let config = ModuleConfig::from_toml_str(r#"
//!     name = "books"
//!
//!     [transport.sse]
//!     expose = true
//!     address = ":9090"
//!
//!     [log]
//!     request = true
//!     exclude = ["ping"]
//! "#).unwrap();
//!
//! assert_eq!(config.name, "books");
//! assert_eq!(config.version, "1.0.0");
//! assert!(config.transport.sse.expose);
//! assert_eq!(config.transport.sse.sse_endpoint, "/sse");
//! assert!(config.log.excludes("ping"));
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// Default server name reported on `initialize`.
pub const DEFAULT_SERVER_NAME: &str = "MCP Server";

/// Default server version reported on `initialize`.
pub const DEFAULT_SERVER_VERSION: &str = "1.0.0";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Usage instructions returned on `initialize`; empty means none.
    pub instructions: String,
    /// Capability toggles.
    pub capabilities: CapabilitiesConfig,
    /// Transport settings.
    pub transport: TransportConfig,
    /// Trace payload and exclusion settings.
    pub trace: PayloadConfig,
    /// Log payload and exclusion settings.
    pub log: PayloadConfig,
    /// Metrics settings.
    pub metrics: MetricsConfig,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            version: DEFAULT_SERVER_VERSION.to_string(),
            instructions: String::new(),
            capabilities: CapabilitiesConfig::default(),
            transport: TransportConfig::default(),
            trace: PayloadConfig::default(),
            log: PayloadConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl ModuleConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ServerError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot be served.
    pub fn validate(&self) -> Result<(), ServerError> {
        let sse = &self.transport.sse;
        if sse.keep_alive && sse.keep_alive_interval == 0 {
            return Err(ServerError::InvalidConfig(
                "transport.sse.keep_alive_interval must be at least 1 second when keep_alive is on"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Instructions, if any were configured.
    #[must_use]
    pub fn instructions(&self) -> Option<&str> {
        Some(self.instructions.as_str()).filter(|s| !s.is_empty())
    }
}

/// Which capability families `initialize` advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitiesConfig {
    /// Advertise resources and resource templates.
    pub resources: bool,
    /// Advertise prompts.
    pub prompts: bool,
    /// Advertise tools.
    pub tools: bool,
    /// Advertise logging.
    pub logging: bool,
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            resources: true,
            prompts: true,
            tools: true,
            logging: true,
        }
    }
}

/// Transport settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// SSE transport.
    pub sse: SseConfig,
    /// Stdio transport.
    pub stdio: StdioConfig,
}

/// SSE transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SseConfig {
    /// Start the SSE server with the module.
    pub expose: bool,
    /// Listen address; an empty host (`":8082"`) means all interfaces.
    pub address: String,
    /// Public base URL prefixed to the advertised message endpoint.
    pub base_url: String,
    /// Path prefix for both endpoints.
    pub base_path: String,
    /// Path of the event stream endpoint.
    pub sse_endpoint: String,
    /// Path of the message submission endpoint.
    pub message_endpoint: String,
    /// Send keep-alive comments on idle streams.
    pub keep_alive: bool,
    /// Keep-alive interval in seconds.
    pub keep_alive_interval: u64,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            expose: false,
            address: ":8082".to_string(),
            base_url: String::new(),
            base_path: String::new(),
            sse_endpoint: "/sse".to_string(),
            message_endpoint: "/message".to_string(),
            keep_alive: false,
            keep_alive_interval: 10,
        }
    }
}

impl SseConfig {
    /// The address to hand to the socket layer.
    ///
    /// ```
    /// use mcpmod_server::config::SseConfig;
    ///
    /// let mut config = SseConfig::default();
    /// assert_eq!(config.bind_address(), "0.0.0.0:8082");
    /// config.address = "127.0.0.1:0".to_string();
    /// assert_eq!(config.bind_address(), "127.0.0.1:0");
    /// ```
    #[must_use]
    pub fn bind_address(&self) -> String {
        if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        }
    }

    /// Keep-alive interval as a duration.
    #[must_use]
    pub const fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_interval)
    }

    /// Full path of the event stream endpoint.
    #[must_use]
    pub fn sse_path(&self) -> String {
        format!("{}{}", self.base_path, self.sse_endpoint)
    }

    /// Full path of the message endpoint.
    #[must_use]
    pub fn message_path(&self) -> String {
        format!("{}{}", self.base_path, self.message_endpoint)
    }
}

/// Stdio transport settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StdioConfig {
    /// Start the stdio server with the module.
    pub expose: bool,
}

/// Payload inclusion and method exclusion, shared by `trace` and `log`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// Include the request payload.
    pub request: bool,
    /// Include the response payload.
    pub response: bool,
    /// Methods that are never traced (or logged).
    pub exclude: Vec<String>,
}

impl PayloadConfig {
    /// Whether `method` is in the exclusion list.
    #[must_use]
    pub fn excludes(&self, method: &str) -> bool {
        self.exclude.iter().any(|m| m == method)
    }
}

/// Metrics settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Collection settings.
    pub collect: MetricsCollectConfig,
    /// Histogram buckets in seconds; empty keeps the Prometheus defaults.
    pub buckets: Vec<f64>,
}

/// Metrics collection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsCollectConfig {
    /// Collect request metrics.
    pub enabled: bool,
    /// Metric namespace.
    pub namespace: String,
    /// Metric subsystem.
    pub subsystem: String,
}
