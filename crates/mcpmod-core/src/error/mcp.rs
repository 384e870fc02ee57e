use miette::Diagnostic;
use thiserror::Error;

use super::codes;

type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type shared by the protocol engine, capability handlers and
/// transports.
///
/// `Display` is the message the client receives, so handler errors read
/// exactly as the handler wrote them.
#[derive(Error, Diagnostic, Debug)]
pub enum McpError {
    /// The payload is not valid JSON.
    #[error("Parse error: {message}")]
    #[diagnostic(
        code(mcpmod::parse_error),
        help("each message must be a single JSON-RPC 2.0 object")
    )]
    Parse {
        /// What could not be parsed.
        message: String,
        /// The decoder failure.
        #[source]
        source: Option<Source>,
    },

    /// The method is not served.
    #[error("Method not found: {method}")]
    #[diagnostic(code(mcpmod::method_not_found))]
    MethodNotFound {
        /// The requested method.
        method: String,
    },

    /// The params do not fit the method.
    #[error("{message}")]
    #[diagnostic(code(mcpmod::invalid_params))]
    InvalidParams {
        /// The method whose params were rejected.
        method: String,
        /// What is wrong with them.
        message: String,
        /// The decoder failure, if any.
        #[source]
        source: Option<Source>,
    },

    /// No resource or template matches the URI.
    #[error("Resource not found: {uri}")]
    #[diagnostic(
        code(mcpmod::resource_not_found),
        help("check the URI against resources/list and resources/templates/list")
    )]
    ResourceNotFound {
        /// The requested URI.
        uri: String,
    },

    /// A handler or the server itself failed.
    #[error("{message}")]
    #[diagnostic(code(mcpmod::internal), severity(error))]
    Internal {
        /// The failure as reported to the client.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Source>,
    },

    /// The stream carrying the request failed.
    #[error("Transport error: {message}")]
    #[diagnostic(code(mcpmod::transport))]
    Transport {
        /// The failure.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Source>,
    },

    /// Another error with a note on what was being done.
    #[error("{context}: {source}")]
    #[diagnostic(code(mcpmod::context))]
    WithContext {
        /// What was being done.
        context: String,
        /// The wrapped error.
        #[source]
        source: Box<McpError>,
    },
}

impl McpError {
    /// A parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// A method not found error.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// An invalid params error for `method`.
    pub fn invalid_params(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            method: method.into(),
            message: message.into(),
            source: None,
        }
    }

    /// An invalid params error from a decoding failure.
    pub fn invalid_params_with_source<E>(method: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InvalidParams {
            method: method.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// A resource not found error.
    pub fn resource_not_found(uri: impl Into<String>) -> Self {
        Self::ResourceNotFound { uri: uri.into() }
    }

    /// An internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// An internal error keeping its cause.
    pub fn internal_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// A transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// A transport error keeping its cause.
    pub fn transport_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The JSON-RPC code for this error.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse { .. } => codes::PARSE_ERROR,
            Self::MethodNotFound { .. } => codes::METHOD_NOT_FOUND,
            Self::InvalidParams { .. } => codes::INVALID_PARAMS,
            Self::ResourceNotFound { .. } => codes::RESOURCE_NOT_FOUND,
            Self::Internal { .. } => codes::INTERNAL_ERROR,
            Self::Transport { .. } => codes::TRANSPORT_ERROR,
            Self::WithContext { source, .. } => source.code(),
        }
    }

    /// The innermost error, skipping context layers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        Self::transport_with_source(err.to_string(), err)
    }
}

/// Context on top of a `Result<T, McpError>`, keeping the error code.
///
/// ```rust
/// use mcpmod_core::error::{McpError, McpResultExt};
///
/// fn fetch() -> Result<(), McpError> {
///     Err(McpError::internal("timeout")).context("fetching the weather")
/// }
///
/// assert_eq!(fetch().unwrap_err().to_string(), "fetching the weather: timeout");
/// ```
pub trait McpResultExt<T> {
    /// Wrap the error with `context`.
    fn context(self, context: impl Into<String>) -> Result<T, McpError>;

    /// Wrap the error with a context computed only on failure.
    fn with_context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Result<T, McpError>;
}

impl<T> McpResultExt<T> for Result<T, McpError> {
    fn context(self, context: impl Into<String>) -> Self {
        self.with_context(|| context)
    }

    fn with_context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Self {
        self.map_err(|source| McpError::WithContext {
            context: f().into(),
            source: Box::new(source),
        })
    }
}
