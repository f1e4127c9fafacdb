//! Unified error handling for mcpmount.
//!
//! Every fallible operation returns [`McpError`]. Handler errors raised in
//! a direct mount reach the caller as-is; errors that cross a proxy
//! session travel as [`JsonRpcError`] and are decoded back with
//! [`McpError::from_jsonrpc`].
//!
//! ```rust
//! use mcpmount_core::component::ComponentKind;
//! use mcpmount_core::error::{McpError, McpResultExt};
//!
//! fn lookup() -> Result<(), McpError> {
//!     Err(McpError::not_found(ComponentKind::Tool, "a_ping"))
//! }
//!
//! let err = lookup().context("dispatching from the gateway").unwrap_err();
//! assert!(err.is_not_found());
//! ```

pub mod codes;
mod context;
mod details;
mod jsonrpc;
mod transport;
mod types;

pub use codes::*;
pub use context::McpResultExt;
pub use details::{
    BoxError, CollisionDetails, InvalidParamsDetails, LifecycleDetails, LifecyclePhase,
    SubserverFailureDetails, ToolExecutionDetails, TransportDetails,
};
pub use jsonrpc::JsonRpcError;
pub use transport::TransportErrorKind;
pub use types::McpError;
