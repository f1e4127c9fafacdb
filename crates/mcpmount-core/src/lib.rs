//! # mcpmount-core
//!
//! Core types for composing Model Context Protocol (MCP) servers.
//!
//! This crate provides the runtime-agnostic building blocks shared by the
//! server and transport crates:
//!
//! - **Component types**: tools, resources, resource templates, prompts
//! - **Prefixing**: the identifier convention used by both import and mount
//! - **Protocol types**: JSON-RPC 2.0 request/response/notification types
//! - **Error handling**: a single `McpError` type with miette diagnostics
//!
//! # Example
//!
//! ```rust
//! use mcpmount_core::component::ComponentKind;
//! use mcpmount_core::prefix::{apply_prefix, strip_prefix, Separators};
//!
//! let seps = Separators::default();
//! let external = apply_prefix(ComponentKind::Tool, "weather", &seps, "forecast");
//! assert_eq!(external, "weather_forecast");
//!
//! let uri = apply_prefix(ComponentKind::Resource, "docs", &seps, "file:///readme.md");
//! assert_eq!(uri, "docs+file:///readme.md");
//!
//! assert_eq!(
//!     strip_prefix(ComponentKind::Tool, "weather", &seps, &external),
//!     Some("forecast")
//! );
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_name_repetitions)]

pub mod capability;
pub mod component;
pub mod error;
pub mod prefix;
pub mod protocol;
pub mod types;
pub mod uri_template;

pub use capability::{ClientInfo, InitializeResult, PROTOCOL_VERSION, ServerInfo};
pub use component::{ComponentKind, ComponentMeta, ComponentRequest, ComponentResponse};
pub use error::{JsonRpcError, McpError, McpResultExt};
pub use prefix::{PrefixRule, Separators, apply_prefix, strip_prefix};
pub use protocol::{Message, Notification, Request, RequestId, Response};
pub use uri_template::UriTemplate;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::capability::{ClientInfo, InitializeResult, ServerInfo};
    pub use crate::component::{ComponentKind, ComponentMeta, ComponentRequest, ComponentResponse};
    pub use crate::error::{McpError, McpResultExt};
    pub use crate::prefix::{PrefixRule, Separators};
    pub use crate::protocol::{Message, Notification, Request, RequestId, Response};
    pub use crate::types::{
        CallToolResult, Content, GetPromptResult, Prompt, PromptArgument, PromptMessage,
        ReadResourceResult, Resource, ResourceContents, ResourceTemplate, Role, Tool,
        ToolOutput,
    };
}
