//! Server and client identification exchanged during initialization.

use serde::{Deserialize, Serialize};

/// The MCP protocol version spoken by in-process sessions.
pub const PROTOCOL_VERSION: &str = "2025-11-25";

/// Information about a server, returned from `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl ServerInfo {
    /// Create new server info.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self::new("mcpmount-server", env!("CARGO_PKG_VERSION"))
    }
}

/// Information about a client, sent with `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: String,
}

impl ClientInfo {
    /// Create new client info.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Result of a successful `initialize` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    /// The protocol version the server agreed to.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// The server's identity.
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}
