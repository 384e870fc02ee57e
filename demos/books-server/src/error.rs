use thiserror::Error;

use mcpmod_server::ServerError;

/// Failures of the books server outside request handling.
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        /// Path of the file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this application.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The MCP module failed.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The admin listener failed.
    #[error("admin server error: {0}")]
    Admin(#[source] std::io::Error),

    /// The log subscriber could not be installed.
    #[error("failed to install logging: {0}")]
    Logging(String),
}
