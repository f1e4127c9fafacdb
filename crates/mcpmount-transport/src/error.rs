//! Transport error types.

use mcpmount_core::error::{McpError, TransportErrorKind};
use thiserror::Error;

/// Errors that can occur during transport operations.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The peer closed the connection.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The transport was closed locally.
    #[error("Not connected")]
    NotConnected,

    /// A message could not be encoded or decoded.
    #[error("Invalid message: {message}")]
    InvalidMessage {
        /// Description of the problem.
        message: String,
    },

    /// The peer broke the request/response contract.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },
}

impl TransportError {
    /// Create an invalid message error.
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage {
            message: message.into(),
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Get the transport error kind.
    #[must_use]
    pub const fn kind(&self) -> TransportErrorKind {
        match self {
            Self::ConnectionClosed => TransportErrorKind::ConnectionClosed,
            Self::NotConnected => TransportErrorKind::ConnectionFailed,
            Self::InvalidMessage { .. } => TransportErrorKind::InvalidMessage,
            Self::Protocol { .. } => TransportErrorKind::ProtocolViolation,
        }
    }
}

impl From<TransportError> for McpError {
    fn from(err: TransportError) -> Self {
        Self::transport(err.kind(), err.to_string())
    }
}
