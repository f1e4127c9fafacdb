//! # mcpmount
//!
//! Compose Model Context Protocol servers out of smaller ones.
//!
//! A parent [`Server`] exposes the tools, resources, resource templates
//! and prompts of its children under name prefixes:
//!
//! - **import** copies a snapshot of a child's components,
//! - **mount** delegates to the child on every request, either by a
//!   direct call or through a proxy [`Session`](server::Session) that
//!   honours the child's [`Lifespan`] hooks.
//!
//! ## Quick Start
//!
//! ```rust
//! use mcpmount::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let a = Server::new("a");
//! a.tool(Tool::new("ping"), |_args, _ctx| async { Ok(ToolOutput::text("pong")) });
//!
//! let parent = Server::new("parent");
//! parent.mount("a", &a, MountOptions::default())?;
//!
//! let result = parent.call_tool("a_ping", serde_json::json!({})).await?;
//! assert_eq!(result.first_text(), Some("pong"));
//! # Ok::<(), McpError>(())
//! # }).unwrap();
//! ```
//!
//! ## Crate Organization
//!
//! - [`mcpmount_core`] - component types, prefixing, errors, JSON-RPC
//!   messages
//! - [`mcpmount_transport`] - the `Transport` trait and the in-memory
//!   transport
//! - [`mod@mcpmount_server`] - the server, import, mount, dispatch and
//!   proxy sessions

#![deny(missing_docs)]
#![warn(clippy::unwrap_used)]

// Re-export all public items from core
pub use mcpmount_core::*;

pub use mcpmount_server::{
    CancellationToken, Context, ImportOptions, ImportSummary, Lifespan, MountId, MountMode,
    MountOptions, RuntimeConfig, Server, ServerBuilder, SessionPolicy,
};

pub use mcpmount_transport::{MemoryTransport, Transport, TransportMetadata};

pub mod prelude;

/// Server module re-exports
pub mod server {
    //! Server, composition and session types.
    pub use mcpmount_server::*;
}

/// Transport module re-exports
pub mod transport {
    //! Transport layer types.
    pub use mcpmount_transport::*;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;
        let separators = Separators::default();
        assert_eq!(separators.resource, "+");
        assert_eq!(MountMode::default(), MountMode::Auto);
    }
}
