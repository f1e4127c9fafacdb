//! Boxed detail payloads for the larger `McpError` variants.

use std::fmt;

use super::transport::TransportErrorKind;
use crate::component::ComponentKind;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Details for invalid params errors.
#[derive(Debug)]
pub struct InvalidParamsDetails {
    /// The method that received invalid parameters.
    pub method: String,
    /// Human-readable error message.
    pub message: String,
    /// The underlying error, if available.
    pub source: Option<BoxError>,
}

impl fmt::Display for InvalidParamsDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid params for '{}': {}", self.method, self.message)
    }
}

impl std::error::Error for InvalidParamsDetails {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Details for transport errors.
#[derive(Debug)]
pub struct TransportDetails {
    /// Classification of the transport error.
    pub kind: TransportErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// The underlying error, if available.
    pub source: Option<BoxError>,
}

impl fmt::Display for TransportDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transport error ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportDetails {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Details for tool execution errors.
#[derive(Debug)]
pub struct ToolExecutionDetails {
    /// The name of the tool that failed.
    pub tool: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional structured error data.
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for ToolExecutionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tool '{}' failed: {}", self.tool, self.message)
    }
}

impl std::error::Error for ToolExecutionDetails {}

/// One external identifier that two sources both claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionDetails {
    /// Kind of component that collided.
    pub kind: ComponentKind,
    /// The contested external identifier.
    pub identifier: String,
    /// Name of the server that already held it.
    pub existing_owner: String,
    /// Name of the server whose copy arrived second.
    pub incoming_owner: String,
}

impl fmt::Display for CollisionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' from '{}' collides with the one from '{}'",
            self.kind, self.identifier, self.incoming_owner, self.existing_owner
        )
    }
}

impl std::error::Error for CollisionDetails {}

/// An error raised inside a mounted subserver, relayed to the caller.
///
/// `code` is the subserver's own error code so it can be surfaced
/// unchanged.
#[derive(Debug)]
pub struct SubserverFailureDetails {
    /// Name of the proxied server that raised the error.
    pub server: String,
    /// The subserver's error code.
    pub code: i32,
    /// The subserver's error message.
    pub message: String,
    /// Structured data attached by the subserver.
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for SubserverFailureDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subserver '{}' failed: {}", self.server, self.message)
    }
}

impl std::error::Error for SubserverFailureDetails {}

/// Which lifespan hook failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// `Lifespan::startup`.
    Startup,
    /// `Lifespan::shutdown`.
    Shutdown,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
        })
    }
}

/// Details for a failed lifespan hook.
#[derive(Debug)]
pub struct LifecycleDetails {
    /// Name of the server whose hook failed.
    pub server: String,
    /// The hook that failed.
    pub phase: LifecyclePhase,
    /// Human-readable error message.
    pub message: String,
    /// The underlying error, if available.
    pub source: Option<BoxError>,
}

impl fmt::Display for LifecycleDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lifespan {} failed for '{}': {}",
            self.phase, self.server, self.message
        )
    }
}

impl std::error::Error for LifecycleDetails {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
