//! Wire form of `McpError` and the decoding used on the proxy side.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::codes;
use super::details::LifecyclePhase;
use super::types::McpError;
use crate::component::ComponentKind;

/// A JSON-RPC error response object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Create an error with no data.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an "invalid params" error (-32602).
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, message)
    }

    /// Create an "internal error" (-32603).
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, message)
    }

    /// Create a "method not found" error (-32601).
    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(codes::METHOD_NOT_FOUND, message)
    }
}

impl From<&McpError> for JsonRpcError {
    fn from(err: &McpError) -> Self {
        let data = match err {
            McpError::NotFound { kind, identifier } => Some(json!({
                "kind": kind,
                "identifier": identifier,
            })),
            McpError::Lifecycle(details) => Some(json!({
                "server": details.server,
                "phase": details.phase,
                "message": details.message,
            })),
            McpError::CycleDetected { parent, child } => Some(json!({
                "parent": parent,
                "child": child,
            })),
            McpError::ToolExecution(details) => details
                .data
                .clone()
                .or_else(|| Some(json!({ "tool": details.tool }))),
            McpError::SubserverFailure(details) => details.data.clone(),
            McpError::WithContext { source, .. } => Self::from(source.as_ref()).data,
            _ => None,
        };

        Self {
            code: err.code(),
            message: err.to_string(),
            data,
        }
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        Self::from(&err)
    }
}

impl McpError {
    /// Decode an error that came back from the proxied server `server`.
    ///
    /// Not-found, lifecycle and cancellation errors keep their variant so a
    /// caller cannot tell a proxied failure from a direct one. Every other
    /// code becomes [`McpError::SubserverFailure`] carrying the original
    /// code, message and data.
    #[must_use]
    pub fn from_jsonrpc(server: &str, err: JsonRpcError) -> Self {
        let data = err.data.as_ref();
        let field = |name: &str| {
            data.and_then(|d| d.get(name))
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        };

        match err.code {
            codes::COMPONENT_NOT_FOUND => {
                let kind = data
                    .and_then(|d| d.get("kind"))
                    .and_then(|k| serde_json::from_value::<ComponentKind>(k.clone()).ok());
                match (kind, field("identifier")) {
                    (Some(kind), Some(identifier)) => Self::not_found(kind, identifier),
                    _ => Self::subserver_failure(server, err.code, err.message, err.data),
                }
            }
            codes::LIFECYCLE_ERROR => {
                let phase = data
                    .and_then(|d| d.get("phase"))
                    .and_then(|p| serde_json::from_value::<LifecyclePhase>(p.clone()).ok())
                    .unwrap_or(LifecyclePhase::Startup);
                let server = field("server").unwrap_or_else(|| server.to_owned());
                let message = field("message").unwrap_or(err.message);
                Self::lifecycle(server, phase, message, None)
            }
            codes::CANCELLED => Self::cancelled_with_reason(server, err.message),
            code => Self::subserver_failure(server, code, err.message, err.data),
        }
    }
}
