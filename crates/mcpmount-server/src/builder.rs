//! Fluent builder for [`Server`].
//!
//! `Server::new` covers the common case. The builder adds a version, a
//! [`Lifespan`], the default session policy for proxy mounts, and the
//! runtime settings used when the server is served through a session.
//!
//! # Example
//!
//! ```rust
//! use mcpmount_server::{RuntimeConfig, Server, SessionPolicy};
//!
//! let server = Server::builder("reports")
//!     .version("2.1.0")
//!     .session_policy(SessionPolicy::PerCall)
//!     .runtime_config(RuntimeConfig {
//!         max_concurrent_requests: 4,
//!         ..RuntimeConfig::default()
//!     })
//!     .build();
//!
//! assert_eq!(server.info().version, "2.1.0");
//! assert_eq!(server.session_policy(), SessionPolicy::PerCall);
//! assert!(!server.has_lifespan());
//! ```

use std::sync::{Arc, RwLock};

use mcpmount_core::capability::ServerInfo;

use crate::capability::Registry;
use crate::config::RuntimeConfig;
use crate::lifespan::Lifespan;
use crate::server::{Server, ServerId, ServerInner};
use crate::session::SessionPolicy;

/// Builder for [`Server`].
pub struct ServerBuilder {
    name: String,
    version: String,
    lifespan: Option<Arc<dyn Lifespan>>,
    session_policy: SessionPolicy,
    runtime_config: RuntimeConfig,
}

impl ServerBuilder {
    /// Create a builder for a server called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            lifespan: None,
            session_policy: SessionPolicy::default(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Set the version reported by `initialize`.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Attach startup/teardown hooks.
    pub fn lifespan(self, lifespan: impl Lifespan) -> Self {
        self.lifespan_arc(Arc::new(lifespan))
    }

    /// Attach shared startup/teardown hooks.
    pub fn lifespan_arc(mut self, lifespan: Arc<dyn Lifespan>) -> Self {
        self.lifespan = Some(lifespan);
        self
    }

    /// Default session policy for proxy mounts of this server.
    pub fn session_policy(mut self, policy: SessionPolicy) -> Self {
        self.session_policy = policy;
        self
    }

    /// Settings for sessions that serve this server.
    pub fn runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Build the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server::from_inner(Arc::new(ServerInner {
            id: ServerId::new(),
            info: ServerInfo::new(self.name, self.version),
            registry: RwLock::new(Registry::new()),
            mounts: RwLock::new(Arc::new(Vec::new())),
            lifespan: self.lifespan,
            session_policy: self.session_policy,
            runtime_config: self.runtime_config,
        }))
    }
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("has_lifespan", &self.lifespan.is_some())
            .field("session_policy", &self.session_policy)
            .finish_non_exhaustive()
    }
}
