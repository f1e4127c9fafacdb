//! The composable server object.
//!
//! A [`Server`] owns a component registry and an ordered list of mounts.
//! It is a cheap handle: clones share state, and nothing about it is
//! global, so any number of servers can be built and torn down in one
//! process.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mcpmount_core::capability::ServerInfo;
use mcpmount_core::component::{ComponentKind, ComponentMeta};
use mcpmount_core::error::McpError;
use mcpmount_core::types::{
    GetPromptResult, Prompt, Resource, ResourceContents, ResourceTemplate, Tool, ToolOutput,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::builder::ServerBuilder;
use crate::capability::prompts::PromptArgs;
use crate::capability::{
    Owner, Registered, RegisteredPrompt, RegisteredResource, RegisteredTemplate, RegisteredTool,
    Registry,
};
use crate::config::RuntimeConfig;
use crate::context::Context;
use crate::lifespan::Lifespan;
use crate::mount::{Mount, MountTarget};
use crate::session::SessionPolicy;

/// Stable identity of a server, used for cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerId(Uuid);

impl ServerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub(crate) struct ServerInner {
    pub(crate) id: ServerId,
    pub(crate) info: ServerInfo,
    pub(crate) registry: RwLock<Registry>,
    pub(crate) mounts: RwLock<Arc<Vec<Mount>>>,
    pub(crate) lifespan: Option<Arc<dyn Lifespan>>,
    pub(crate) session_policy: SessionPolicy,
    pub(crate) runtime_config: RuntimeConfig,
}

/// A composable MCP server.
///
/// ```rust
/// use mcpmount_server::Server;
/// use mcpmount_core::component::ComponentKind;
/// use mcpmount_core::types::{Tool, ToolOutput};
///
/// let server = Server::new("calc");
/// server.tool(Tool::new("add"), |args, _ctx| async move {
///     let sum = args["a"].as_i64().unwrap_or(0) + args["b"].as_i64().unwrap_or(0);
///     Ok(ToolOutput::text(sum.to_string()))
/// });
///
/// let names: Vec<_> = server
///     .components(ComponentKind::Tool)
///     .iter()
///     .map(|m| m.identifier().to_string())
///     .collect();
/// assert_eq!(names, ["add"]);
/// ```
#[derive(Clone)]
pub struct Server {
    pub(crate) inner: Arc<ServerInner>,
}

impl Server {
    /// Create a server with default settings and no lifespan.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    /// Start building a server.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ServerBuilder {
        ServerBuilder::new(name)
    }

    pub(crate) fn from_inner(inner: Arc<ServerInner>) -> Self {
        Self { inner }
    }

    /// The server's stable identity.
    #[must_use]
    pub fn id(&self) -> ServerId {
        self.inner.id
    }

    /// The server name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.info.name
    }

    /// Name and version reported by `initialize`.
    #[must_use]
    pub fn info(&self) -> &ServerInfo {
        &self.inner.info
    }

    /// Whether the server declares startup/teardown hooks.
    #[must_use]
    pub fn has_lifespan(&self) -> bool {
        self.inner.lifespan.is_some()
    }

    /// The server's lifespan hooks, if any.
    #[must_use]
    pub fn lifespan(&self) -> Option<&Arc<dyn Lifespan>> {
        self.inner.lifespan.as_ref()
    }

    /// How proxy mounts of this server hold their sessions by default.
    #[must_use]
    pub fn session_policy(&self) -> SessionPolicy {
        self.inner.session_policy
    }

    /// Settings for sessions that serve this server.
    #[must_use]
    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.inner.runtime_config
    }

    /// Whether two handles refer to the same server.
    #[must_use]
    pub fn same_server(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn owner(&self) -> Owner {
        Owner::of(&self.inner)
    }

    pub(crate) fn registry(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn registry_mut(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the mount list, oldest first.
    #[must_use]
    pub fn mounts(&self) -> Arc<Vec<Mount>> {
        Arc::clone(
            &self
                .inner
                .mounts
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Swap in a new mount list built from the current one.
    pub(crate) fn update_mounts<R>(&self, f: impl FnOnce(&mut Vec<Mount>) -> R) -> R {
        let mut guard = self
            .inner
            .mounts
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::clone(&guard);
        let out = f(&mut next);
        *guard = Arc::new(next);
        out
    }

    /// Whether `target` is this server or is reachable through its mounts.
    pub(crate) fn reaches(&self, target: &Self) -> bool {
        self.same_server(target)
            || self
                .mounts()
                .iter()
                .any(|mount| mount.server().reaches(target))
    }

    fn register(&self, record: Registered) {
        let kind = record.kind();
        let identifier = record.identifier().to_owned();
        if self.registry_mut().insert(record).is_some() {
            warn!(server = self.name(), %kind, %identifier, "replaced existing component");
        } else {
            debug!(server = self.name(), %kind, %identifier, "registered component");
        }
    }

    /// Register a tool. Re-registering a name replaces the old tool.
    pub fn tool<F, Fut>(&self, tool: Tool, handler: F) -> &Self
    where
        F: Fn(Value, &Context<'_>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, McpError>> + Send + 'static,
    {
        self.register(Registered::Tool(RegisteredTool::new(tool, self.owner(), handler)));
        self
    }

    /// Register a static resource. The handler receives the URI.
    pub fn resource<F, Fut>(&self, resource: Resource, handler: F) -> &Self
    where
        F: Fn(String, &Context<'_>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResourceContents, McpError>> + Send + 'static,
    {
        self.register(Registered::Resource(RegisteredResource::new(
            resource,
            self.owner(),
            handler,
        )));
        self
    }

    /// Register a resource template. The handler receives the URI and the
    /// template variable bindings.
    pub fn resource_template<F, Fut>(&self, template: ResourceTemplate, handler: F) -> &Self
    where
        F: Fn(String, HashMap<String, String>, &Context<'_>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResourceContents, McpError>> + Send + 'static,
    {
        self.register(Registered::Template(RegisteredTemplate::new(
            template,
            self.owner(),
            handler,
        )));
        self
    }

    /// Register a prompt.
    pub fn prompt<F, Fut>(&self, prompt: Prompt, handler: F) -> &Self
    where
        F: Fn(PromptArgs, &Context<'_>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GetPromptResult, McpError>> + Send + 'static,
    {
        self.register(Registered::Prompt(RegisteredPrompt::new(prompt, self.owner(), handler)));
        self
    }

    /// Remove a component of `kind`. Returns whether anything was removed.
    pub fn remove(&self, kind: ComponentKind, identifier: &str) -> bool {
        let removed = self.registry_mut().remove(kind, identifier).is_some();
        if removed {
            debug!(server = self.name(), %kind, identifier, "removed component");
        }
        removed
    }

    /// Remove a tool by name.
    pub fn remove_tool(&self, name: &str) -> bool {
        self.remove(ComponentKind::Tool, name)
    }

    /// Remove a static resource by URI.
    pub fn remove_resource(&self, uri: &str) -> bool {
        self.remove(ComponentKind::Resource, uri)
    }

    /// Remove a resource template by pattern.
    pub fn remove_resource_template(&self, pattern: &str) -> bool {
        self.remove(ComponentKind::ResourceTemplate, pattern)
    }

    /// Remove a prompt by name.
    pub fn remove_prompt(&self, name: &str) -> bool {
        self.remove(ComponentKind::Prompt, name)
    }

    /// Metadata of the components registered on this server itself,
    /// sorted by identifier. Mounted components are not included; see
    /// [`list`](Self::list) for the aggregated view.
    #[must_use]
    pub fn components(&self, kind: ComponentKind) -> Vec<ComponentMeta> {
        self.registry().metas(kind)
    }

    /// Close every proxy session held by this server's mounts, including
    /// those of directly mounted children.
    ///
    /// Sessions reopen on next use, so the server stays usable. The first
    /// error is returned after every session has been closed.
    pub async fn shutdown(&self) -> Result<(), McpError> {
        let mut first_error = None;
        for mount in self.mounts().iter() {
            let result = match mount.target() {
                MountTarget::Direct(child) => Box::pin(child.shutdown()).await,
                MountTarget::Proxy(link) => link.close().await,
            };
            if let Err(err) = result {
                warn!(server = self.name(), prefix = mount.prefix(), error = %err, "shutdown failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("id", &self.inner.id)
            .field("name", &self.inner.info.name)
            .field("mounts", &self.mounts().len())
            .field("has_lifespan", &self.has_lifespan())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let server = Server::new("s");
        let clone = server.clone();
        clone.tool(Tool::new("ping"), |_, _| async { Ok(ToolOutput::text("pong")) });

        assert!(server.same_server(&clone));
        assert_eq!(server.components(ComponentKind::Tool).len(), 1);
        assert_eq!(server.id(), clone.id());
    }

    #[test]
    fn test_reregistration_overwrites() {
        let server = Server::new("s");
        server.tool(Tool::new("ping").description("old"), |_, _| async {
            Ok(ToolOutput::text("old"))
        });
        server.tool(Tool::new("ping").description("new"), |_, _| async {
            Ok(ToolOutput::text("new"))
        });

        let tools = server.components(ComponentKind::Tool);
        assert_eq!(tools.len(), 1);
        match &tools[0] {
            ComponentMeta::Tool(t) => assert_eq!(t.description.as_deref(), Some("new")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_remove_by_kind() {
        let server = Server::new("s");
        server.prompt(Prompt::new("greet"), |_, _| async { Ok(GetPromptResult::user("hi")) });
        assert!(!server.remove_tool("greet"));
        assert!(server.remove_prompt("greet"));
        assert!(server.components(ComponentKind::Prompt).is_empty());
    }

    #[test]
    fn test_owner_points_back() {
        let server = Server::new("origin");
        let owner = server.owner();
        assert_eq!(owner.name(), "origin");
        assert!(owner.server().unwrap().same_server(&server));
    }

    #[test]
    fn test_distinct_servers_have_distinct_ids() {
        assert_ne!(Server::new("a").id(), Server::new("a").id());
    }
}
