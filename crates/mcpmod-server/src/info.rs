//! Module introspection payload.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::registry::RegistryInfo;
use crate::transport::{ServerStatus, SseServerInfo};

/// Name the module reports itself under.
pub const MODULE_NAME: &str = "mcp";

/// Snapshot of transports and registered capabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleInfo {
    /// Server section.
    pub server: ServerSection,
}

/// The `server` object of [`ModuleInfo`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerSection {
    /// Per-transport status.
    pub transport: TransportSection,
    /// Tool names to handler identities.
    pub tools: BTreeMap<String, String>,
    /// Prompt names to handler identities.
    pub prompts: BTreeMap<String, String>,
    /// Resource names to handler identities.
    pub resources: BTreeMap<String, String>,
    /// Resource template names to handler identities.
    #[serde(rename = "resourceTemplates")]
    pub resource_templates: BTreeMap<String, String>,
}

/// The `transport` object of [`ModuleInfo`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportSection {
    /// SSE configuration and status.
    pub sse: SseServerInfo,
    /// Stdio status.
    pub stdio: ServerStatus,
}

impl ModuleInfo {
    /// Assemble from its parts.
    #[must_use]
    pub fn new(sse: SseServerInfo, stdio: ServerStatus, registry: RegistryInfo) -> Self {
        Self {
            server: ServerSection {
                transport: TransportSection { sse, stdio },
                tools: registry.tools,
                prompts: registry.prompts,
                resources: registry.resources,
                resource_templates: registry.resource_templates,
            },
        }
    }

    /// Module name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        MODULE_NAME
    }
}
