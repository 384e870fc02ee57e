//! Application configuration: the books settings next to the MCP module
//! settings, both read from one TOML file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use mcpmod_server::ModuleConfig;

use crate::error::Error;

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Books application settings.
    pub app: BooksConfig,
    /// MCP module settings.
    pub mcp: ModuleConfig,
}

/// Books application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooksConfig {
    /// Greeted when the `greet` prompt gets no name.
    pub owner: String,
    /// Base URL of the weather service.
    pub weather_host: String,
    /// Where `/metrics` and `/info` are served.
    pub admin_address: String,
}

impl Default for BooksConfig {
    fn default() -> Self {
        Self {
            owner: "John".to_string(),
            weather_host: "https://wttr.in".to_string(),
            admin_address: "127.0.0.1:8081".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
