//! The session boundary used by proxy mounts.
//!
//! A [`Session`] is one client connection to a subserver. Opening it runs
//! the subserver's startup hook and closing it runs the shutdown hook,
//! exactly once each. A [`SessionConnector`] opens sessions; the default
//! [`InProcessConnector`] serves the subserver over an in-memory transport
//! in the same process.

use std::sync::Arc;

use async_lock::Mutex;
use async_trait::async_trait;
use mcpmount_core::component::{ComponentKind, ComponentMeta, ComponentRequest, ComponentResponse};
use mcpmount_core::error::{LifecyclePhase, McpError};
use mcpmount_transport::MemoryTransport;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::ClientSession;
use crate::config::RuntimeConfig;
use crate::context::CancellationToken;
use crate::runtime;
use crate::server::Server;

/// How a proxy mount holds sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicy {
    /// One shared session, opened on first use.
    #[default]
    Persistent,
    /// A fresh session for every call, closed afterwards.
    PerCall,
}

/// One open client connection to a server.
#[async_trait]
pub trait Session: Send + Sync {
    /// Send a component request. Tripping `cancel` abandons the request and
    /// tells the server to stop working on it.
    async fn call(
        &self,
        request: ComponentRequest,
        cancel: &CancellationToken,
    ) -> Result<ComponentResponse, McpError>;

    /// List the server's components of `kind`.
    async fn list(&self, kind: ComponentKind) -> Result<Vec<ComponentMeta>, McpError>;

    /// Check that the server answers.
    async fn ping(&self) -> Result<(), McpError>;

    /// Close the session. The server's shutdown hook has run when this
    /// returns.
    async fn close(&self) -> Result<(), McpError>;

    /// Whether the session can still carry requests.
    fn is_open(&self) -> bool;
}

/// Opens sessions to a server.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// Open a session to `server`. Fails with a `Lifecycle` error if the
    /// server's startup hook fails.
    async fn open_session(&self, server: &Server) -> Result<Arc<dyn Session>, McpError>;
}

/// Serves the server in a spawned task over an in-memory transport.
#[derive(Debug, Clone, Default)]
pub struct InProcessConnector {
    config: Option<RuntimeConfig>,
}

impl InProcessConnector {
    /// A connector that uses each server's own runtime settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector that uses `config` for every server.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            config: Some(config),
        }
    }
}

#[async_trait]
impl SessionConnector for InProcessConnector {
    async fn open_session(&self, server: &Server) -> Result<Arc<dyn Session>, McpError> {
        let config = self
            .config
            .clone()
            .unwrap_or_else(|| server.runtime_config().clone());
        let (client_end, server_end) =
            MemoryTransport::named_pair(config.channel_capacity, &config.client_name, server.name());

        let runtime = tokio::spawn(runtime::serve(server.clone(), server_end, config.clone()));
        match ClientSession::connect(client_end, server.name(), &config).await {
            Ok(client) => {
                debug!(server = server.name(), "in-process session open");
                Ok(Arc::new(InProcessSession {
                    server_name: server.name().to_owned(),
                    client,
                    runtime: Mutex::new(Some(runtime)),
                }))
            }
            Err(err) => {
                // The client end is gone, so the runtime winds down on its own.
                let _ = runtime.await;
                Err(err)
            }
        }
    }
}

/// A session whose server runs in a task of this process.
pub struct InProcessSession {
    server_name: String,
    client: ClientSession,
    runtime: Mutex<Option<JoinHandle<Result<(), McpError>>>>,
}

#[async_trait]
impl Session for InProcessSession {
    async fn call(
        &self,
        request: ComponentRequest,
        cancel: &CancellationToken,
    ) -> Result<ComponentResponse, McpError> {
        self.client.call(request, cancel).await
    }

    async fn list(&self, kind: ComponentKind) -> Result<Vec<ComponentMeta>, McpError> {
        self.client.list(kind).await
    }

    async fn ping(&self) -> Result<(), McpError> {
        self.client.ping().await
    }

    async fn close(&self) -> Result<(), McpError> {
        Session::close(&self.client).await?;
        let Some(runtime) = self.runtime.lock().await.take() else {
            return Ok(());
        };
        match runtime.await {
            Ok(result) => result,
            Err(join) => Err(McpError::lifecycle(
                &self.server_name,
                LifecyclePhase::Shutdown,
                format!("session runtime did not finish: {join}"),
                None,
            )),
        }
    }

    fn is_open(&self) -> bool {
        self.client.is_open()
    }
}

impl std::fmt::Debug for InProcessSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcessSession")
            .field("server", &self.server_name)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifespan::Lifespan;
    use mcpmount_core::types::{Tool, ToolOutput};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        started: AtomicUsize,
        stopped: AtomicUsize,
    }

    #[async_trait]
    impl Lifespan for Arc<Counting> {
        async fn startup(&self, _server: &Server) -> Result<(), McpError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn shutdown(&self, _server: &Server) -> Result<(), McpError> {
            self.stopped.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_session_runs_hooks_once() {
        let counts = Arc::new(Counting::default());
        let server = Server::builder("hooked").lifespan(Arc::clone(&counts)).build();
        server.tool(Tool::new("ping"), |_, _| async { Ok(ToolOutput::text("pong")) });

        let session = InProcessConnector::new().open_session(&server).await.unwrap();
        assert_eq!(counts.started.load(Ordering::SeqCst), 1);

        session.ping().await.unwrap();
        let response = session
            .call(ComponentRequest::call_tool("ping", serde_json::json!({})), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.into_tool().unwrap().first_text(), Some("pong"));

        session.close().await.unwrap();
        assert!(!session.is_open());
        assert_eq!(counts.started.load(Ordering::SeqCst), 1);
        assert_eq!(counts.stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_over_session_is_not_found() {
        let server = Server::new("plain");
        let session = InProcessConnector::new().open_session(&server).await.unwrap();

        let err = session
            .call(ComponentRequest::call_tool("nope", serde_json::json!({})), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            McpError::NotFound { kind: ComponentKind::Tool, ref identifier } if identifier == "nope"
        ));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_listing_over_session() {
        let server = Server::new("plain");
        server.tool(Tool::new("b"), |_, _| async { Ok(ToolOutput::text("")) });
        server.tool(Tool::new("a"), |_, _| async { Ok(ToolOutput::text("")) });
        let session = InProcessConnector::new().open_session(&server).await.unwrap();

        let names: Vec<_> = session
            .list(ComponentKind::Tool)
            .await
            .unwrap()
            .iter()
            .map(|m| m.identifier().to_string())
            .collect();
        assert_eq!(names, ["a", "b"]);
        session.close().await.unwrap();
    }

    #[test]
    fn test_policy_wire_names() {
        let policy: SessionPolicy = serde_json::from_str(r#""per_call""#).unwrap();
        assert_eq!(policy, SessionPolicy::PerCall);
        assert_eq!(SessionPolicy::default(), SessionPolicy::Persistent);
    }
}
