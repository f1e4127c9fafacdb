//! Startup and teardown hooks.
//!
//! A server with a [`Lifespan`] is mounted in proxy mode by default. Its
//! hooks then run once per session: `startup` when a session opens and
//! `shutdown` when it closes. Import and direct mounts never run them.

use async_trait::async_trait;
use mcpmount_core::error::McpError;

use crate::server::Server;

/// Hooks run around every session of a server.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use mcpmount_core::error::McpError;
/// use mcpmount_server::{Lifespan, Server};
///
/// struct Warmup;
///
/// #[async_trait]
/// impl Lifespan for Warmup {
///     async fn startup(&self, server: &Server) -> Result<(), McpError> {
///         tracing::info!(server = server.name(), "warming caches");
///         Ok(())
///     }
/// }
///
/// let server = Server::builder("cache").lifespan(Warmup).build();
/// assert!(server.has_lifespan());
/// ```
#[async_trait]
pub trait Lifespan: Send + Sync + 'static {
    /// Run before the session serves its first request.
    ///
    /// An error aborts the session; the next session attempt runs
    /// `startup` again.
    async fn startup(&self, server: &Server) -> Result<(), McpError>;

    /// Run after the session served its last request.
    async fn shutdown(&self, server: &Server) -> Result<(), McpError> {
        let _ = server;
        Ok(())
    }
}
