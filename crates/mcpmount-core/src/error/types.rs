//! The `McpError` enum and its constructors.

use miette::Diagnostic;
use thiserror::Error;

use super::codes;
use super::details::{
    BoxError, CollisionDetails, InvalidParamsDetails, LifecycleDetails, LifecyclePhase,
    SubserverFailureDetails, ToolExecutionDetails, TransportDetails,
};
use super::transport::TransportErrorKind;
use crate::component::ComponentKind;

/// The error type shared by every mcpmount crate.
///
/// Composition adds five variants on top of the JSON-RPC protocol errors:
/// [`NotFound`](Self::NotFound), [`Collision`](Self::Collision),
/// [`SubserverFailure`](Self::SubserverFailure),
/// [`Lifecycle`](Self::Lifecycle) and [`CycleDetected`](Self::CycleDetected).
/// Large variants are boxed to keep `Result<T, McpError>` small.
#[derive(Error, Diagnostic, Debug)]
pub enum McpError {
    // ========================================================================
    // JSON-RPC Protocol Errors
    // ========================================================================
    /// Invalid JSON was received.
    #[error("Parse error: {message}")]
    #[diagnostic(
        code(mcpmount::protocol::parse_error),
        help("Ensure the message is valid JSON-RPC 2.0 format")
    )]
    Parse {
        /// Human-readable error message.
        message: String,
        /// The underlying parse error, if available.
        #[source]
        source: Option<BoxError>,
    },

    /// The JSON sent is not a valid Request object.
    #[error("Invalid request: {message}")]
    #[diagnostic(code(mcpmount::protocol::invalid_request))]
    InvalidRequest {
        /// Human-readable error message.
        message: String,
    },

    /// The method does not exist.
    #[error("Method not found: {method}")]
    #[diagnostic(code(mcpmount::protocol::method_not_found))]
    MethodNotFound {
        /// The method that was requested.
        method: String,
    },

    /// Invalid method parameter(s).
    #[error("Invalid params for '{}': {}", .0.method, .0.message)]
    #[diagnostic(code(mcpmount::protocol::invalid_params))]
    InvalidParams(#[source] Box<InvalidParamsDetails>),

    /// Internal error.
    #[error("Internal error: {message}")]
    #[diagnostic(code(mcpmount::protocol::internal_error), severity(error))]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<BoxError>,
    },

    /// Transport-level error.
    #[error("Transport error ({}): {}", .0.kind, .0.message)]
    #[diagnostic(code(mcpmount::transport::error))]
    Transport(#[source] Box<TransportDetails>),

    /// A tool handler failed.
    #[error("Tool '{}' failed: {}", .0.tool, .0.message)]
    #[diagnostic(code(mcpmount::tool::execution_error))]
    ToolExecution(#[source] Box<ToolExecutionDetails>),

    // ========================================================================
    // Composition Errors
    // ========================================================================
    /// The identifier resolved neither locally nor through any mount.
    #[error("{kind} not found: {identifier}")]
    #[diagnostic(
        code(mcpmount::dispatch::not_found),
        help("Mounted components are only reachable under their prefix")
    )]
    NotFound {
        /// Kind of component requested.
        kind: ComponentKind,
        /// The identifier as the caller sent it.
        identifier: String,
    },

    /// Strict import found two sources for one external identifier.
    #[error("Collision: {0}")]
    #[diagnostic(
        code(mcpmount::import::collision),
        help("Import under a different prefix or disable strict mode")
    )]
    Collision(#[source] Box<CollisionDetails>),

    /// A proxied subserver raised an error that has no typed counterpart.
    #[error("Subserver '{}' failed: {}", .0.server, .0.message)]
    #[diagnostic(code(mcpmount::dispatch::subserver_failure))]
    SubserverFailure(#[source] Box<SubserverFailureDetails>),

    /// A lifespan hook failed. Startup failures are never cached.
    #[error("Lifespan {} failed for '{}': {}", .0.phase, .0.server, .0.message)]
    #[diagnostic(
        code(mcpmount::lifecycle::error),
        help("The next request through this mount retries startup")
    )]
    Lifecycle(#[source] Box<LifecycleDetails>),

    /// Mounting or importing would make a server reach itself.
    #[error("Cycle detected: '{child}' already reaches '{parent}'")]
    #[diagnostic(code(mcpmount::mount::cycle))]
    CycleDetected {
        /// Name of the server being composed into.
        parent: String,
        /// Name of the server being added.
        child: String,
    },

    // ========================================================================
    // Flow Control
    // ========================================================================
    /// An operation timed out.
    #[error("Timeout after {duration:?}: {operation}")]
    #[diagnostic(code(mcpmount::timeout))]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// How long we waited.
        duration: std::time::Duration,
    },

    /// An operation was cancelled.
    #[error("Operation cancelled: {operation}")]
    #[diagnostic(code(mcpmount::cancelled))]
    Cancelled {
        /// The operation that was cancelled.
        operation: String,
        /// Reason for cancellation, if provided.
        reason: Option<String>,
    },

    /// An error with additional context.
    #[error("{context}: {source}")]
    #[diagnostic(code(mcpmount::context))]
    WithContext {
        /// The context message.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<McpError>,
    },
}

impl McpError {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a parse error with a source.
    pub fn parse_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a method not found error.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Create an invalid params error.
    pub fn invalid_params(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams(Box::new(InvalidParamsDetails {
            method: method.into(),
            message: message.into(),
            source: None,
        }))
    }

    /// Create an invalid params error from a deserialization failure.
    pub fn invalid_params_with_source<E: std::error::Error + Send + Sync + 'static>(
        method: impl Into<String>,
        source: E,
    ) -> Self {
        Self::InvalidParams(Box::new(InvalidParamsDetails {
            method: method.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }))
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error with a source.
    pub fn internal_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a transport error.
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport(Box::new(TransportDetails {
            kind,
            message: message.into(),
            source: None,
        }))
    }

    /// Create a tool execution error.
    pub fn tool_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution(Box::new(ToolExecutionDetails {
            tool: tool.into(),
            message: message.into(),
            data: None,
        }))
    }

    /// Create a not-found error for an identifier of the given kind.
    pub fn not_found(kind: ComponentKind, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            identifier: identifier.into(),
        }
    }

    /// Create a collision error.
    pub fn collision(details: CollisionDetails) -> Self {
        Self::Collision(Box::new(details))
    }

    /// Create a subserver failure relayed through the mount at `mount`.
    pub fn subserver_failure(
        server: impl Into<String>,
        code: i32,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self::SubserverFailure(Box::new(SubserverFailureDetails {
            server: server.into(),
            code,
            message: message.into(),
            data,
        }))
    }

    /// Create a startup failure for `server`.
    pub fn startup_failed(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::lifecycle(server, LifecyclePhase::Startup, message, None)
    }

    /// Create a lifespan failure with full details.
    pub fn lifecycle(
        server: impl Into<String>,
        phase: LifecyclePhase,
        message: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self::Lifecycle(Box::new(LifecycleDetails {
            server: server.into(),
            phase,
            message: message.into(),
            source,
        }))
    }

    /// Create a cycle error.
    pub fn cycle(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self::CycleDetected {
            parent: parent.into(),
            child: child.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
            reason: None,
        }
    }

    /// Create a cancelled error with reason.
    pub fn cancelled_with_reason(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
            reason: Some(reason.into()),
        }
    }

    /// Wrap this error with a context message.
    #[must_use]
    pub fn wrap(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through any context wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Get the JSON-RPC error code for this error.
    ///
    /// Subserver failures report the subserver's own code.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse { .. } => codes::PARSE_ERROR,
            Self::InvalidRequest { .. } => codes::INVALID_REQUEST,
            Self::MethodNotFound { .. } => codes::METHOD_NOT_FOUND,
            Self::InvalidParams(_) => codes::INVALID_PARAMS,
            Self::Internal { .. } => codes::INTERNAL_ERROR,
            Self::Transport(_) => codes::TRANSPORT_ERROR,
            Self::ToolExecution(_) => codes::TOOL_EXECUTION_ERROR,
            Self::NotFound { .. } => codes::COMPONENT_NOT_FOUND,
            Self::Collision(_) => codes::COLLISION,
            Self::SubserverFailure(details) => details.code,
            Self::Lifecycle(_) => codes::LIFECYCLE_ERROR,
            Self::CycleDetected { .. } => codes::CYCLE_DETECTED,
            Self::Timeout { .. } => codes::TIMEOUT,
            Self::Cancelled { .. } => codes::CANCELLED,
            Self::WithContext { source, .. } => source.code(),
        }
    }

    /// True if this is (or wraps) a `NotFound`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound { .. })
    }

    /// True if this is (or wraps) a `Lifecycle` error.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self.root(), Self::Lifecycle(_))
    }

    /// True if this is (or wraps) a `Cancelled` error.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Self::Cancelled { .. })
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse_with_source("JSON serialization/deserialization error", err)
    }
}
