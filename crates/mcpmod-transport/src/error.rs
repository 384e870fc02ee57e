//! Transport error types.

use mcpmod_core::error::McpError;
use thiserror::Error;

/// Errors that can occur while framing or routing messages.
#[derive(Error, Debug)]
pub enum TransportError {
    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame was not valid JSON-RPC.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A frame was not valid UTF-8.
    #[error("Invalid UTF-8 in message: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A frame exceeded the size limit.
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge {
        /// Actual frame size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// No open event stream exists for the session.
    #[error("Unknown session: {session_id}")]
    UnknownSession {
        /// The session that was addressed.
        session_id: String,
    },

    /// The event stream for the session was closed.
    #[error("Session closed: {session_id}")]
    SessionClosed {
        /// The session that was addressed.
        session_id: String,
    },
}

impl TransportError {
    /// Whether the stream can keep going after this error.
    ///
    /// Framing errors affect a single message; I/O errors end the stream.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Json(_) | Self::InvalidUtf8(_) | Self::MessageTooLarge { .. }
        )
    }
}

impl From<TransportError> for McpError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Json(e) => e.into(),
            TransportError::InvalidUtf8(e) => Self::Parse {
                message: e.to_string(),
                source: Some(Box::new(e)),
            },
            other => Self::transport_with_source(other.to_string(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(TransportError::from(json).is_recoverable());
        assert!(TransportError::MessageTooLarge { size: 2, max: 1 }.is_recoverable());
        let utf8 = std::str::from_utf8(b"\xff").unwrap_err();
        assert!(TransportError::from(utf8).is_recoverable());

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert!(!TransportError::from(io).is_recoverable());
    }

    #[test]
    fn test_into_mcp_error() {
        let err: McpError = TransportError::UnknownSession {
            session_id: "abc".to_string(),
        }
        .into();
        assert_eq!(err.code(), -32000);
        assert_eq!(err.to_string(), "Transport error: Unknown session: abc");

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: McpError = TransportError::Json(json).into();
        assert_eq!(err.code(), -32700);
    }
}
