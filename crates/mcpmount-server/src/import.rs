//! Static importer.
//!
//! `import_server` copies a snapshot of another server's components into
//! this one under a prefix. The copies share the original handlers, but the
//! parent keeps no reference to the subserver itself: components added to
//! or removed from it afterwards are not reflected.
//!
//! The snapshot is the subserver's *effective* component set. Directly
//! mounted children contribute their own copies; proxy mounts contribute
//! forwarding handlers that go through the proxy link.

use std::collections::HashMap;

use mcpmount_core::component::ComponentKind;
use mcpmount_core::error::{CollisionDetails, McpError};
use mcpmount_core::prefix::{PrefixRule, Separators};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::capability::Registered;
use crate::mount::{MountTarget, claims};
use crate::server::Server;

/// Options for [`Server::import_server`].
///
/// ```rust
/// use mcpmount_server::ImportOptions;
///
/// let options: ImportOptions = serde_json::from_str(r#"{"strict": true}"#).unwrap();
/// assert!(options.strict);
/// assert_eq!(options.separators.resource, "+");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Separators between the prefix and component identifiers.
    pub separators: Separators,
    /// Fail on collisions within the imported set instead of letting the
    /// later component win.
    pub strict: bool,
}

impl ImportOptions {
    /// Options with default separators, not strict.
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

    /// Turn collisions into errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// What an import did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Components written into the parent.
    pub imported: usize,
    /// Identifiers claimed twice within the imported set. The later one
    /// was kept.
    pub collisions: Vec<CollisionDetails>,
    /// Parent components replaced by imported ones.
    pub overwritten: usize,
}

impl Server {
    /// Copy `server`'s components into this server under `prefix`.
    ///
    /// The subserver's lifespan is never run. Importing a server into
    /// itself, or one that reaches this server through its mounts, fails
    /// with `CycleDetected`. In strict mode a collision fails the whole
    /// import and the parent is left untouched.
    pub fn import_server(
        &self,
        prefix: impl Into<String>,
        server: &Server,
        options: ImportOptions,
    ) -> Result<ImportSummary, McpError> {
        let rule = PrefixRule::new(prefix).with_separators(options.separators);
        if server.reaches(self) {
            warn!(parent = self.name(), child = server.name(), prefix = %rule.prefix, "rejected cyclic import");
            return Err(McpError::cycle(self.name(), server.name()));
        }

        let mut summary = ImportSummary::default();
        let mut staged: Vec<Registered> = Vec::new();
        let mut slots: HashMap<(ComponentKind, String), usize> = HashMap::new();

        for record in server.effective_records() {
            let record = record.reprefixed(&rule);
            let key = (record.kind(), record.identifier().to_owned());
            match slots.get(&key) {
                Some(&slot) => {
                    let details = CollisionDetails {
                        kind: key.0,
                        identifier: key.1,
                        existing_owner: staged[slot].owner().name().to_owned(),
                        incoming_owner: record.owner().name().to_owned(),
                    };
                    if options.strict {
                        return Err(McpError::collision(details));
                    }
                    warn!(
                        parent = self.name(),
                        kind = %details.kind,
                        identifier = %details.identifier,
                        kept = %details.incoming_owner,
                        dropped = %details.existing_owner,
                        "import collision"
                    );
                    summary.collisions.push(details);
                    staged[slot] = record;
                }
                None => {
                    slots.insert(key, staged.len());
                    staged.push(record);
                }
            }
        }

        let mut registry = self.registry_mut();
        for record in staged {
            if registry.insert(record).is_some() {
                summary.overwritten += 1;
            }
            summary.imported += 1;
        }
        drop(registry);

        info!(
            parent = self.name(),
            child = server.name(),
            prefix = %rule.prefix,
            imported = summary.imported,
            collisions = summary.collisions.len(),
            overwritten = summary.overwritten,
            "imported server"
        );
        Ok(summary)
    }

    /// Every component this server exposes, under its external
    /// identifiers, in override order: mounts oldest first, then own
    /// components. Later entries win.
    ///
    /// A mounted record is kept only if dispatch would route its external
    /// identifier to that mount.
    pub(crate) fn effective_records(&self) -> Vec<Registered> {
        let mut records = Vec::new();
        let mounts = self.mounts();
        for mount in mounts.iter() {
            let inner = match mount.target() {
                MountTarget::Direct(child) => child.effective_records(),
                MountTarget::Proxy(link) => link.forwarding_records(),
            };
            records.extend(
                inner
                    .iter()
                    .map(|r| r.reprefixed(mount.rule()))
                    .filter(|r| claims(&mounts, mount, r.kind(), r.identifier())),
            );
        }
        records.extend(self.registry().records());
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::MountOptions;
    use mcpmount_core::types::{Resource, ResourceContents, Tool, ToolOutput};
    use serde_json::json;

    #[tokio::test]
    async fn test_import_copies_under_prefix() {
        let child = Server::new("child");
        child.tool(Tool::new("ping"), |_, _| async { Ok(ToolOutput::text("pong")) });
        let parent = Server::new("parent");

        let summary = parent.import_server("a", &child, ImportOptions::new()).unwrap();
        assert_eq!(summary.imported, 1);
        assert!(summary.collisions.is_empty());

        let result = parent.call_tool("a_ping", json!({})).await.unwrap();
        assert_eq!(result.first_text(), Some("pong"));
    }

    #[test]
    fn test_import_shares_the_handler() {
        let child = Server::new("child");
        child.tool(Tool::new("ping"), |_, _| async { Ok(ToolOutput::text("pong")) });
        let parent = Server::new("parent");
        parent.import_server("a", &child, ImportOptions::new()).unwrap();

        let original = child.registry().tools.get("ping").cloned().unwrap();
        let copy = parent.registry().tools.get("a_ping").cloned().unwrap();
        assert!(std::sync::Arc::ptr_eq(&original.handler, &copy.handler));
        assert_eq!(copy.tool.name, "a_ping");
        assert_eq!(copy.owner.name(), "child");
    }

    #[tokio::test]
    async fn test_import_is_a_snapshot() {
        let child = Server::new("child");
        child.resource(Resource::new("data://x", "X"), |uri, _| async move {
            Ok(ResourceContents::text(uri, "x"))
        });
        let parent = Server::new("parent");
        parent.import_server("r", &child, ImportOptions::new()).unwrap();

        child.remove_resource("data://x");
        child.tool(Tool::new("late"), |_, _| async { Ok(ToolOutput::text("late")) });

        assert!(parent.read_resource("r+data://x").await.is_ok());
        assert!(parent.call_tool("r_late", json!({})).await.unwrap_err().is_not_found());
    }

    #[test]
    fn test_flattening_collision_later_wins() {
        let deep = Server::new("deep");
        deep.tool(Tool::new("y"), |_, _| async { Ok(ToolOutput::text("deep")) });
        let inner = Server::new("inner");
        inner.tool(Tool::new("x_y"), |_, _| async { Ok(ToolOutput::text("inner")) });

        // Mounted "x_y" from deep, own "x_y" copied from inner.
        let child = Server::new("child");
        child.mount("x", &deep, MountOptions::new()).unwrap();
        child.import_server("", &inner, ImportOptions::new()).unwrap();

        let parent = Server::new("parent");
        let summary = parent.import_server("p", &child, ImportOptions::new()).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.collisions.len(), 1);
        let collision = &summary.collisions[0];
        assert_eq!(collision.identifier, "p_x_y");
        assert_eq!(collision.existing_owner, "deep");
        assert_eq!(collision.incoming_owner, "inner");
    }

    #[tokio::test]
    async fn test_import_skips_shadowed_mount_components() {
        let old = Server::new("old");
        old.tool(Tool::new("ping"), |_, _| async { Ok(ToolOutput::text("pong")) });
        let child = Server::new("child");
        child.mount("a", &old, MountOptions::new()).unwrap();
        child.mount("a", &Server::new("empty"), MountOptions::new()).unwrap();
        assert!(child.call_tool("a_ping", json!({})).await.unwrap_err().is_not_found());

        let parent = Server::new("parent");
        let summary = parent.import_server("r", &child, ImportOptions::new()).unwrap();
        assert_eq!(summary.imported, 0);
        assert!(parent.call_tool("r_a_ping", json!({})).await.unwrap_err().is_not_found());
    }

    #[test]
    fn test_strict_collision_leaves_parent_untouched() {
        let child = Server::new("child");
        child.tool(Tool::new("a_b"), |_, _| async { Ok(ToolOutput::text("own")) });
        let sub = Server::new("sub");
        sub.tool(Tool::new("b"), |_, _| async { Ok(ToolOutput::text("sub")) });
        child.mount("a", &sub, MountOptions::new()).unwrap();

        let parent = Server::new("parent");
        let err = parent
            .import_server("p", &child, ImportOptions::new().strict(true))
            .unwrap_err();
        assert!(matches!(err, McpError::Collision(_)));
        assert!(parent.components(ComponentKind::Tool).is_empty());
    }

    #[test]
    fn test_reimport_counts_overwrites() {
        let child = Server::new("child");
        child.tool(Tool::new("ping"), |_, _| async { Ok(ToolOutput::text("pong")) });
        let parent = Server::new("parent");

        parent.import_server("a", &child, ImportOptions::new()).unwrap();
        let again = parent.import_server("a", &child, ImportOptions::new()).unwrap();
        assert_eq!(again.overwritten, 1);
        assert_eq!(parent.components(ComponentKind::Tool).len(), 1);
    }

    #[test]
    fn test_cyclic_import_is_rejected() {
        let a = Server::new("a");
        let b = Server::new("b");
        b.mount("a", &a, MountOptions::new()).unwrap();

        assert!(matches!(
            a.import_server("self", &a, ImportOptions::new()),
            Err(McpError::CycleDetected { .. })
        ));
        assert!(matches!(
            a.import_server("b", &b, ImportOptions::new()),
            Err(McpError::CycleDetected { .. })
        ));
    }
}
