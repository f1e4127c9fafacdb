//! Composable MCP servers.
//!
//! A [`Server`] holds tools, resources, resource templates and prompts,
//! and can be composed with other servers in two ways:
//!
//! - [`Server::import_server`] copies a snapshot of another server's
//!   components under a prefix. Later changes to the other server are not
//!   seen.
//! - [`Server::mount`] delegates to another server at request time. A
//!   direct mount calls the subserver in place; a proxy mount goes through
//!   a [`Session`], which runs the subserver's [`Lifespan`] hooks.
//!
//! Requests are resolved by [`Server::dispatch`]: the server's own
//! registry first, then its mounts, newest first.
//!
//! # Example
//!
//! ```rust
//! use mcpmount_core::types::{Tool, ToolOutput};
//! use mcpmount_server::{ImportOptions, MountOptions, Server};
//!
//! # tokio_test::block_on(async {
//! let echo = Server::new("echo");
//! echo.tool(Tool::new("ping"), |_args, _ctx| async { Ok(ToolOutput::text("pong")) });
//!
//! let gateway = Server::new("gateway");
//! gateway.import_server("copy", &echo, ImportOptions::default()).unwrap();
//! gateway.mount("live", &echo, MountOptions::default()).unwrap();
//!
//! let copied = gateway.call_tool("copy_ping", serde_json::json!({})).await.unwrap();
//! let live = gateway.call_tool("live_ping", serde_json::json!({})).await.unwrap();
//! assert_eq!(copied.first_text(), live.first_text());
//! # });
//! ```
//!
//! # Sessions
//!
//! Proxy mounts talk JSON-RPC to the subserver over a
//! [`mcpmount_transport::Transport`]. The default [`InProcessConnector`]
//! runs the subserver's [`runtime::serve`] loop in a task of this process;
//! a custom [`SessionConnector`] can reach servers anywhere else.

#![deny(missing_docs)]

pub mod builder;
pub mod capability;
pub mod client;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod import;
pub mod lifespan;
pub mod mount;
pub mod runtime;
pub mod server;
pub mod session;

pub use builder::ServerBuilder;
pub use capability::{Owner, Registered, Registry};
pub use client::ClientSession;
pub use config::RuntimeConfig;
pub use context::{CancellationToken, Context};
pub use import::{ImportOptions, ImportSummary};
pub use lifespan::Lifespan;
pub use mount::{Mount, MountId, MountMode, MountOptions, MountTarget, ProxyLink};
pub use runtime::serve;
pub use server::{Server, ServerId};
pub use session::{InProcessConnector, InProcessSession, Session, SessionConnector, SessionPolicy};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::ServerBuilder;
    pub use crate::config::RuntimeConfig;
    pub use crate::context::{CancellationToken, Context};
    pub use crate::import::{ImportOptions, ImportSummary};
    pub use crate::lifespan::Lifespan;
    pub use crate::mount::{MountMode, MountOptions};
    pub use crate::server::Server;
    pub use crate::session::{Session, SessionConnector, SessionPolicy};
}
