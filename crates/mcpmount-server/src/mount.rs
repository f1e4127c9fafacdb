//! Dynamic mount table.
//!
//! A mount binds a prefix to a live subserver. Nothing is copied: every
//! request under the prefix is resolved against the subserver at the time
//! it arrives, so components added to the subserver later are visible at
//! once.
//!
//! The mount list is copy-on-write. Mounting or unmounting swaps in a new
//! `Arc<Vec<Mount>>`, so a request scanning the list sees either the old
//! list or the new one.
//!
//! # Modes
//!
//! - [`MountMode::Direct`] calls into the subserver's dispatcher in
//!   process.
//! - [`MountMode::Proxy`] sends the request through a [`Session`], which
//!   runs the subserver's [`Lifespan`](crate::Lifespan) hooks.
//! - [`MountMode::Auto`] picks `Proxy` when the subserver has a lifespan
//!   and `Direct` otherwise.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use mcpmount_core::component::{ComponentKind, ComponentMeta, ComponentRequest, ComponentResponse};
use mcpmount_core::error::{McpError, McpResultExt};
use mcpmount_core::prefix::{PrefixRule, Separators};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capability::prompts::boxed_prompt;
use crate::capability::resources::{boxed_resource, boxed_template};
use crate::capability::tools::boxed_tool;
use crate::capability::{
    Registered, RegisteredPrompt, RegisteredResource, RegisteredTemplate, RegisteredTool,
};
use crate::context::CancellationToken;
use crate::server::Server;
use crate::session::{InProcessConnector, Session, SessionConnector, SessionPolicy};

/// Identity of one mount binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MountId(Uuid);

impl MountId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for MountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// How a mount reaches its subserver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountMode {
    /// `Proxy` if the subserver has a lifespan, else `Direct`.
    #[default]
    Auto,
    /// In-process call into the subserver's dispatcher.
    Direct,
    /// Through a session that honours the subserver's lifespan.
    Proxy,
}

impl MountMode {
    /// Resolve `Auto` against `server`.
    #[must_use]
    pub fn resolve(self, server: &Server) -> Self {
        match self {
            Self::Auto if server.has_lifespan() => Self::Proxy,
            Self::Auto => Self::Direct,
            explicit => explicit,
        }
    }
}

/// Options for [`Server::mount`].
#[derive(Clone, Default)]
pub struct MountOptions {
    /// Separators between the prefix and component identifiers.
    pub separators: Separators,
    /// Mount mode.
    pub mode: MountMode,
    /// Session policy for proxy mode. Defaults to the subserver's own.
    pub session_policy: Option<SessionPolicy>,
    connector: Option<Arc<dyn SessionConnector>>,
}

impl MountOptions {
    /// Options with default separators and `Auto` mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tool separator.
    pub fn tool_separator(mut self, separator: impl Into<String>) -> Self {
        self.separators.tool = separator.into();
        self
    }

    /// Set the resource and resource template separator.
    pub fn resource_separator(mut self, separator: impl Into<String>) -> Self {
        self.separators.resource = separator.into();
        self
    }

    /// Set the prompt separator.
    pub fn prompt_separator(mut self, separator: impl Into<String>) -> Self {
        self.separators.prompt = separator.into();
        self
    }

    /// Replace all separators.
    pub fn separators(mut self, separators: Separators) -> Self {
        self.separators = separators;
        self
    }

    /// Set the mount mode.
    pub fn mode(mut self, mode: MountMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the session policy for proxy mode.
    pub fn session_policy(mut self, policy: SessionPolicy) -> Self {
        self.session_policy = Some(policy);
        self
    }

    /// Open proxy sessions with `connector` instead of the in-process one.
    pub fn connector(mut self, connector: impl SessionConnector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }
}

impl std::fmt::Debug for MountOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountOptions")
            .field("separators", &self.separators)
            .field("mode", &self.mode)
            .field("session_policy", &self.session_policy)
            .field("custom_connector", &self.connector.is_some())
            .finish()
    }
}

/// Where a mount forwards its requests.
#[derive(Clone)]
pub enum MountTarget {
    /// Call the subserver's dispatcher directly.
    Direct(Server),
    /// Go through a proxy session.
    Proxy(Arc<ProxyLink>),
}

/// One binding in a server's mount list.
#[derive(Clone)]
pub struct Mount {
    id: MountId,
    rule: PrefixRule,
    target: MountTarget,
}

impl Mount {
    /// The binding's identity.
    #[must_use]
    pub const fn id(&self) -> MountId {
        self.id
    }

    /// The prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.rule.prefix
    }

    /// Prefix and separators.
    #[must_use]
    pub const fn rule(&self) -> &PrefixRule {
        &self.rule
    }

    /// Where requests go.
    #[must_use]
    pub const fn target(&self) -> &MountTarget {
        &self.target
    }

    /// The mounted subserver.
    #[must_use]
    pub fn server(&self) -> &Server {
        match &self.target {
            MountTarget::Direct(server) => server,
            MountTarget::Proxy(link) => link.server(),
        }
    }

    /// The resolved mode, `Direct` or `Proxy`.
    #[must_use]
    pub const fn mode(&self) -> MountMode {
        match self.target {
            MountTarget::Direct(_) => MountMode::Direct,
            MountTarget::Proxy(_) => MountMode::Proxy,
        }
    }
}

impl std::fmt::Debug for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mount")
            .field("id", &self.id)
            .field("prefix", &self.rule.prefix)
            .field("mode", &self.mode())
            .field("server", &self.server().name())
            .finish()
    }
}

/// Serializes every change to any server's mount list.
///
/// Each server guards its own list, but a cycle spans two lists, so the
/// reachability check and the append must happen under one lock.
static COMPOSITION: StdMutex<()> = StdMutex::new(());

fn composition_lock() -> MutexGuard<'static, ()> {
    COMPOSITION.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The binding a request for `identifier` is forwarded to: the newest one
/// whose rule strips it, together with the local identifier.
pub(crate) fn claim<'m, 'a>(
    mounts: &'m [Mount],
    kind: ComponentKind,
    identifier: &'a str,
) -> Option<(&'m Mount, &'a str)> {
    mounts
        .iter()
        .rev()
        .find_map(|mount| mount.rule.strip(kind, identifier).map(|local| (mount, local)))
}

/// Whether `external` resolves to `mount` rather than a newer binding.
pub(crate) fn claims(mounts: &[Mount], mount: &Mount, kind: ComponentKind, external: &str) -> bool {
    claim(mounts, kind, external).is_some_and(|(owner, _)| owner.id == mount.id)
}

/// The session side of a proxy mount.
///
/// With [`SessionPolicy::Persistent`] one session is opened on first use
/// and shared. Concurrent first callers wait on the same open, and a
/// failed open leaves the slot empty so the next call starts over. With
/// [`SessionPolicy::PerCall`] every call opens and closes its own session.
pub struct ProxyLink {
    server: Server,
    connector: Arc<dyn SessionConnector>,
    policy: SessionPolicy,
    slot: Mutex<Option<Arc<dyn Session>>>,
}

impl ProxyLink {
    /// A link to `server` that opens sessions with `connector`.
    pub fn new(server: Server, connector: Arc<dyn SessionConnector>, policy: SessionPolicy) -> Self {
        Self {
            server,
            connector,
            policy,
            slot: Mutex::new(None),
        }
    }

    /// The proxied server.
    #[must_use]
    pub const fn server(&self) -> &Server {
        &self.server
    }

    /// The session policy in effect.
    #[must_use]
    pub const fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Whether a persistent session is currently held.
    pub async fn has_session(&self) -> bool {
        self.slot.lock().await.as_ref().is_some_and(|s| s.is_open())
    }

    async fn open(&self) -> Result<Arc<dyn Session>, McpError> {
        debug!(server = self.server.name(), policy = ?self.policy, "opening proxy session");
        self.connector
            .open_session(&self.server)
            .await
            .inspect_err(|err| {
                warn!(server = self.server.name(), error = %err, "proxy session failed to open");
            })
    }

    async fn shared(&self) -> Result<Arc<dyn Session>, McpError> {
        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.as_ref().filter(|s| s.is_open()) {
            return Ok(Arc::clone(session));
        }
        let session = self.open().await?;
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    async fn acquire(&self) -> Result<Arc<dyn Session>, McpError> {
        match self.policy {
            SessionPolicy::Persistent => self.shared().await,
            SessionPolicy::PerCall => self.open().await,
        }
    }

    async fn release(&self, session: &Arc<dyn Session>) {
        if self.policy == SessionPolicy::PerCall {
            if let Err(err) = session.close().await {
                warn!(server = self.server.name(), error = %err, "closing per-call session failed");
            }
        }
    }

    /// Send one component request through a session.
    pub async fn call(
        &self,
        request: ComponentRequest,
        cancel: &CancellationToken,
    ) -> Result<ComponentResponse, McpError> {
        let session = self.acquire().await?;
        let result = session.call(request, cancel).await;
        self.release(&session).await;
        result
    }

    /// List the proxied server's components through a session.
    pub async fn list(&self, kind: ComponentKind) -> Result<Vec<ComponentMeta>, McpError> {
        let session = self.acquire().await?;
        let result = session.list(kind).await;
        self.release(&session).await;
        result
    }

    /// Close the persistent session, if one is open.
    pub async fn close(&self) -> Result<(), McpError> {
        let session = self.slot.lock().await.take();
        match session {
            Some(session) => {
                debug!(server = self.server.name(), "closing proxy session");
                session
                    .close()
                    .await
                    .with_context(|| format!("closing session to {}", self.server.name()))
            }
            None => Ok(()),
        }
    }

    /// Records that forward to the proxied server through this link, one
    /// per component it exposes, under the proxied server's identifiers.
    ///
    /// Metadata is taken from the in-process server, so building these does
    /// not open a session.
    pub(crate) fn forwarding_records(self: &Arc<Self>) -> Vec<Registered> {
        self.server
            .effective_records()
            .into_iter()
            .map(|record| self.forwarder(record))
            .collect()
    }

    fn forwarder(self: &Arc<Self>, record: Registered) -> Registered {
        let link = Arc::clone(self);
        match record {
            Registered::Tool(r) => {
                let name = r.tool.name.clone();
                Registered::Tool(RegisteredTool {
                    tool: r.tool,
                    owner: r.owner,
                    handler: boxed_tool(move |args, ctx| {
                        let link = Arc::clone(&link);
                        let request = ComponentRequest::call_tool(name.clone(), args);
                        let cancel = ctx.cancellation_token().clone();
                        Box::pin(async move { link.call(request, &cancel).await?.into_tool() })
                    }),
                })
            }
            Registered::Resource(r) => Registered::Resource(RegisteredResource::from_handler(
                r.resource,
                r.owner,
                boxed_resource(move |uri, ctx| {
                    let link = Arc::clone(&link);
                    let cancel = ctx.cancellation_token().clone();
                    Box::pin(async move {
                        link.call(ComponentRequest::read_resource(uri), &cancel)
                            .await?
                            .into_resource()
                    })
                }),
            )),
            Registered::Template(r) => Registered::Template(RegisteredTemplate::from_handler(
                r.template,
                r.owner,
                boxed_template(move |uri, _params, ctx| {
                    let link = Arc::clone(&link);
                    let cancel = ctx.cancellation_token().clone();
                    Box::pin(async move {
                        link.call(ComponentRequest::read_resource(uri), &cancel)
                            .await?
                            .into_resource()
                    })
                }),
            )),
            Registered::Prompt(r) => {
                let name = r.prompt.name.clone();
                Registered::Prompt(RegisteredPrompt {
                    prompt: r.prompt,
                    owner: r.owner,
                    handler: boxed_prompt(move |args, ctx| {
                        let link = Arc::clone(&link);
                        let request = ComponentRequest::get_prompt(name.clone(), args);
                        let cancel = ctx.cancellation_token().clone();
                        Box::pin(async move { link.call(request, &cancel).await?.into_prompt() })
                    }),
                })
            }
        }
    }
}

impl std::fmt::Debug for ProxyLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyLink")
            .field("server", &self.server.name())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Mount `server` under `prefix`.
    ///
    /// Mounting the same prefix again adds a second binding that shadows
    /// the first. Fails with `CycleDetected` if `server` is this server or
    /// already reaches it through its own mounts.
    pub fn mount(
        &self,
        prefix: impl Into<String>,
        server: &Server,
        options: MountOptions,
    ) -> Result<MountId, McpError> {
        let prefix = prefix.into();
        // Held until the new binding is in place, so two servers mounting
        // each other concurrently cannot both pass the cycle check.
        let _composition = composition_lock();
        if server.reaches(self) {
            warn!(parent = self.name(), child = server.name(), %prefix, "rejected cyclic mount");
            return Err(McpError::cycle(self.name(), server.name()));
        }

        let mode = options.mode.resolve(server);
        let target = match mode {
            MountMode::Proxy => {
                let connector = options.connector.unwrap_or_else(|| Arc::new(InProcessConnector::new()));
                let policy = options.session_policy.unwrap_or_else(|| server.session_policy());
                MountTarget::Proxy(Arc::new(ProxyLink::new(server.clone(), connector, policy)))
            }
            MountMode::Direct | MountMode::Auto => MountTarget::Direct(server.clone()),
        };

        let mount = Mount {
            id: MountId::new(),
            rule: PrefixRule::new(prefix).with_separators(options.separators),
            target,
        };
        let id = mount.id;
        info!(
            parent = self.name(),
            child = server.name(),
            prefix = mount.prefix(),
            mode = ?mount.mode(),
            "mounted server"
        );
        self.update_mounts(|mounts| mounts.push(mount));
        Ok(id)
    }

    /// Remove every binding under `prefix`, closing their persistent proxy
    /// sessions. Returns how many bindings were removed.
    pub async fn unmount(&self, prefix: &str) -> usize {
        let removed: Vec<Mount> = {
            let _composition = composition_lock();
            self.update_mounts(|mounts| {
                let (gone, kept): (Vec<Mount>, Vec<Mount>) = std::mem::take(mounts)
                    .into_iter()
                    .partition(|m| m.prefix() == prefix);
                *mounts = kept;
                gone
            })
        };

        for mount in &removed {
            if let MountTarget::Proxy(link) = mount.target() {
                if let Err(err) = link.close().await {
                    warn!(prefix, error = %err, "closing session of unmounted server failed");
                }
            }
        }
        if !removed.is_empty() {
            info!(parent = self.name(), prefix, count = removed.len(), "unmounted");
        }
        removed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifespan::Lifespan;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Lifespan for Noop {
        async fn startup(&self, _server: &Server) -> Result<(), McpError> {
            Ok(())
        }
    }

    #[test]
    fn test_auto_mode_follows_lifespan() {
        let plain = Server::new("plain");
        let hooked = Server::builder("hooked").lifespan(Noop).build();

        assert_eq!(MountMode::Auto.resolve(&plain), MountMode::Direct);
        assert_eq!(MountMode::Auto.resolve(&hooked), MountMode::Proxy);
        assert_eq!(MountMode::Direct.resolve(&hooked), MountMode::Direct);
        assert_eq!(MountMode::Proxy.resolve(&plain), MountMode::Proxy);
    }

    #[test]
    fn test_mount_appends_bindings() {
        let parent = Server::new("parent");
        let child = Server::new("child");
        let first = parent.mount("a", &child, MountOptions::new()).unwrap();
        let second = parent.mount("a", &child, MountOptions::new()).unwrap();

        assert_ne!(first, second);
        let mounts = parent.mounts();
        assert_eq!(mounts.len(), 2);
        assert!(mounts.iter().all(|m| m.mode() == MountMode::Direct));
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_mounts() {
        let parent = Server::new("parent");
        let before = parent.mounts();
        parent
            .mount("a", &Server::new("child"), MountOptions::new())
            .unwrap();
        assert!(before.is_empty());
        assert_eq!(parent.mounts().len(), 1);
    }

    #[test]
    fn test_cycles_are_rejected() {
        let a = Server::new("a");
        let b = Server::new("b");
        let c = Server::new("c");

        let err = a.mount("self", &a, MountOptions::new()).unwrap_err();
        assert!(matches!(err, McpError::CycleDetected { .. }));

        a.mount("b", &b, MountOptions::new()).unwrap();
        b.mount("c", &c, MountOptions::new()).unwrap();
        let err = c.mount("a", &a, MountOptions::new()).unwrap_err();
        assert!(matches!(err, McpError::CycleDetected { .. }));
    }

    #[test]
    fn test_concurrent_mutual_mounts_never_form_a_cycle() {
        use std::sync::Barrier;

        for _ in 0..200 {
            let a = Server::new("a");
            let b = Server::new("b");
            let barrier = Barrier::new(2);
            let (ab, ba) = std::thread::scope(|scope| {
                let ab = scope.spawn(|| {
                    barrier.wait();
                    a.mount("b", &b, MountOptions::new()).is_ok()
                });
                let ba = scope.spawn(|| {
                    barrier.wait();
                    b.mount("a", &a, MountOptions::new()).is_ok()
                });
                (ab.join().unwrap(), ba.join().unwrap())
            });
            assert!(ab ^ ba, "exactly one of the mutual mounts must succeed");
        }
    }

    #[tokio::test]
    async fn test_unmount_removes_every_binding_with_prefix() {
        let parent = Server::new("parent");
        let child = Server::new("child");
        parent.mount("a", &child, MountOptions::new()).unwrap();
        parent.mount("b", &child, MountOptions::new()).unwrap();
        parent.mount("a", &child, MountOptions::new()).unwrap();

        assert_eq!(parent.unmount("a").await, 2);
        assert_eq!(parent.unmount("a").await, 0);
        let prefixes: Vec<_> = parent.mounts().iter().map(|m| m.prefix().to_string()).collect();
        assert_eq!(prefixes, ["b"]);
    }

    #[test]
    fn test_options_builders() {
        let options = MountOptions::new()
            .tool_separator("::")
            .resource_separator("/")
            .prompt_separator(".")
            .mode(MountMode::Proxy)
            .session_policy(SessionPolicy::PerCall);
        assert_eq!(options.separators.tool, "::");
        assert_eq!(options.separators.resource, "/");
        assert_eq!(options.separators.prompt, ".");
        assert_eq!(options.session_policy, Some(SessionPolicy::PerCall));
    }
}
