//! JSON-RPC and composition error codes.
//!
//! Composition failures live in the implementation-defined server range
//! so they survive a trip through a proxy session and can be decoded on
//! the other side.

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;

/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i32 = -32600;

/// The method does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;

/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;

/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;

/// Server error range start.
pub const SERVER_ERROR_START: i32 = -32000;

/// Server error range end.
pub const SERVER_ERROR_END: i32 = -32099;

/// A tool, resource or prompt identifier did not resolve.
pub const COMPONENT_NOT_FOUND: i32 = -32002;

/// Transport-level failure.
pub const TRANSPORT_ERROR: i32 = SERVER_ERROR_START;

/// Tool handler failed.
pub const TOOL_EXECUTION_ERROR: i32 = SERVER_ERROR_START - 1;

/// Operation timed out.
pub const TIMEOUT: i32 = SERVER_ERROR_START - 7;

/// Operation was cancelled.
pub const CANCELLED: i32 = SERVER_ERROR_START - 8;

/// A subserver lifespan hook failed.
pub const LIFECYCLE_ERROR: i32 = SERVER_ERROR_START - 9;

/// Composition would make a server contain itself.
pub const CYCLE_DETECTED: i32 = SERVER_ERROR_START - 10;

/// Strict import found an external identifier already taken.
pub const COLLISION: i32 = SERVER_ERROR_START - 11;
