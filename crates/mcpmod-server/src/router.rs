//! Method names and typed request parsing.
//!
//! # Methods
//!
//! - **Lifecycle**: `initialize`, `ping`
//! - **Tools**: `tools/list`, `tools/call`
//! - **Prompts**: `prompts/list`, `prompts/get`
//! - **Resources**: `resources/list`, `resources/read`, `resources/templates/list`
//! - **Logging**: `logging/setLevel`

use serde::de::DeserializeOwned;
use serde_json::Value;

use mcpmod_core::capability::InitializeRequest;
use mcpmod_core::error::McpError;
use mcpmod_core::protocol::Request;
use mcpmod_core::types::{
    CallToolRequest, GetPromptRequest, ListRequest, ReadResourceRequest, SetLevelRequest,
};

/// Request method names.
pub mod methods {
    /// Initialize the connection and negotiate capabilities.
    pub const INITIALIZE: &str = "initialize";
    /// Liveness check.
    pub const PING: &str = "ping";

    /// List available tools.
    pub const TOOLS_LIST: &str = "tools/list";
    /// Call a specific tool with arguments.
    pub const TOOLS_CALL: &str = "tools/call";

    /// List available prompts.
    pub const PROMPTS_LIST: &str = "prompts/list";
    /// Render a specific prompt.
    pub const PROMPTS_GET: &str = "prompts/get";

    /// List static resources.
    pub const RESOURCES_LIST: &str = "resources/list";
    /// Read a resource by URI.
    pub const RESOURCES_READ: &str = "resources/read";
    /// List resource templates.
    pub const RESOURCES_TEMPLATES_LIST: &str = "resources/templates/list";

    /// Set the logging level.
    pub const LOGGING_SET_LEVEL: &str = "logging/setLevel";
}

/// Notification method names.
pub mod notifications {
    /// Sent by the client once initialization completes.
    pub const INITIALIZED: &str = "notifications/initialized";
}

/// A request with its parameters decoded.
///
/// `Unparsed` stands in for requests whose method is unknown or whose
/// parameters failed to decode; hooks still receive it so every request is
/// observed.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRequest {
    /// `initialize`.
    Initialize(InitializeRequest),
    /// `ping`.
    Ping,
    /// `tools/list`.
    ListTools(ListRequest),
    /// `tools/call`.
    CallTool(CallToolRequest),
    /// `prompts/list`.
    ListPrompts(ListRequest),
    /// `prompts/get`.
    GetPrompt(GetPromptRequest),
    /// `resources/list`.
    ListResources(ListRequest),
    /// `resources/read`.
    ReadResource(ReadResourceRequest),
    /// `resources/templates/list`.
    ListResourceTemplates(ListRequest),
    /// `logging/setLevel`.
    SetLevel(SetLevelRequest),
    /// A request that could not be decoded.
    Unparsed {
        /// The method as sent.
        method: String,
        /// The raw parameters.
        params: Option<Value>,
    },
}

/// The capability a request addresses, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// A resource URI.
    Resource(&'a str),
    /// A prompt name.
    Prompt(&'a str),
    /// A tool name.
    Tool(&'a str),
    /// No specific capability.
    None,
}

impl<'a> Target<'a> {
    /// The target identifier, or `""`.
    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        match self {
            Self::Resource(s) | Self::Prompt(s) | Self::Tool(s) => s,
            Self::None => "",
        }
    }
}

impl ParsedRequest {
    /// The method name.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Initialize(_) => methods::INITIALIZE,
            Self::Ping => methods::PING,
            Self::ListTools(_) => methods::TOOLS_LIST,
            Self::CallTool(_) => methods::TOOLS_CALL,
            Self::ListPrompts(_) => methods::PROMPTS_LIST,
            Self::GetPrompt(_) => methods::PROMPTS_GET,
            Self::ListResources(_) => methods::RESOURCES_LIST,
            Self::ReadResource(_) => methods::RESOURCES_READ,
            Self::ListResourceTemplates(_) => methods::RESOURCES_TEMPLATES_LIST,
            Self::SetLevel(_) => methods::LOGGING_SET_LEVEL,
            Self::Unparsed { method, .. } => method,
        }
    }

    /// The resource, prompt or tool the request addresses.
    #[must_use]
    pub fn target(&self) -> Target<'_> {
        match self {
            Self::ReadResource(req) => Target::Resource(&req.uri),
            Self::GetPrompt(req) => Target::Prompt(&req.name),
            Self::CallTool(req) => Target::Tool(&req.name),
            _ => Target::None,
        }
    }

    /// The decoded parameters as JSON.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Initialize(req) => serde_json::to_value(req),
            Self::Ping => Ok(Value::Null),
            Self::ListTools(req)
            | Self::ListPrompts(req)
            | Self::ListResources(req)
            | Self::ListResourceTemplates(req) => serde_json::to_value(req),
            Self::CallTool(req) => serde_json::to_value(req),
            Self::GetPrompt(req) => serde_json::to_value(req),
            Self::ReadResource(req) => serde_json::to_value(req),
            Self::SetLevel(req) => serde_json::to_value(req),
            Self::Unparsed { params, .. } => Ok(params.clone().unwrap_or(Value::Null)),
        }
    }
}

/// Decode a request's parameters according to its method.
///
/// Unknown methods yield [`McpError::MethodNotFound`]; parameters that do not
/// match the method's shape yield [`McpError::InvalidParams`].
pub fn parse_request(request: &Request) -> Result<ParsedRequest, McpError> {
    let method = request.method();
    let params = request.params.as_ref();

    match method {
        methods::INITIALIZE => Ok(ParsedRequest::Initialize(decode(method, params)?)),
        methods::PING => Ok(ParsedRequest::Ping),
        methods::TOOLS_LIST => Ok(ParsedRequest::ListTools(decode(method, params)?)),
        methods::TOOLS_CALL => Ok(ParsedRequest::CallTool(decode(method, params)?)),
        methods::PROMPTS_LIST => Ok(ParsedRequest::ListPrompts(decode(method, params)?)),
        methods::PROMPTS_GET => Ok(ParsedRequest::GetPrompt(decode(method, params)?)),
        methods::RESOURCES_LIST => Ok(ParsedRequest::ListResources(decode(method, params)?)),
        methods::RESOURCES_READ => Ok(ParsedRequest::ReadResource(decode(method, params)?)),
        methods::RESOURCES_TEMPLATES_LIST => Ok(ParsedRequest::ListResourceTemplates(decode(
            method, params,
        )?)),
        methods::LOGGING_SET_LEVEL => Ok(ParsedRequest::SetLevel(decode(method, params)?)),
        _ => Err(McpError::method_not_found(method)),
    }
}

/// Absent parameters decode like an empty object.
fn decode<T: DeserializeOwned>(method: &str, params: Option<&Value>) -> Result<T, McpError> {
    let value = params
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    serde_json::from_value(value).map_err(|e| McpError::invalid_params_with_source(method, e))
}
