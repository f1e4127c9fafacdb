//! Component registry of a server.
//!
//! # Capability Modules
//!
//! - [`tools`]: Tool registration and execution
//! - [`resources`]: Resources and resource templates
//! - [`prompts`]: Prompt registration and rendering
//!
//! A [`Registry`] bundles the three services. Import works on
//! [`Registered`] records, which carry the handler `Arc` and the server
//! that first registered it.

pub mod prompts;
pub mod resources;
pub mod tools;

use std::sync::{Arc, Weak};

use mcpmount_core::component::{ComponentKind, ComponentMeta};
use mcpmount_core::prefix::PrefixRule;

pub use prompts::{BoxedPromptFn, PromptService, RegisteredPrompt};
pub use resources::{
    BoxedResourceFn, BoxedTemplateFn, RegisteredResource, RegisteredTemplate, ResourceService,
};
pub use tools::{BoxedToolFn, RegisteredTool, ToolService};

use crate::server::{Server, ServerInner};

/// Back-reference from a component to the server that registered it.
///
/// Holds the server weakly; it is used for lookups and reporting only.
#[derive(Clone)]
pub struct Owner {
    name: Arc<str>,
    server: Weak<ServerInner>,
}

impl Owner {
    pub(crate) fn of(server: &Arc<ServerInner>) -> Self {
        Self {
            name: Arc::from(server.info.name.as_str()),
            server: Arc::downgrade(server),
        }
    }

    /// An owner with no live server behind it.
    #[cfg(test)]
    pub(crate) fn detached(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            server: Weak::new(),
        }
    }

    /// Name of the owning server.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning server, if it is still alive.
    #[must_use]
    pub fn server(&self) -> Option<Server> {
        self.server.upgrade().map(Server::from_inner)
    }
}

impl std::fmt::Debug for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Owner").field(&self.name).finish()
    }
}

/// A registered component of any kind.
#[derive(Debug, Clone)]
pub enum Registered {
    /// A tool.
    Tool(RegisteredTool),
    /// A static resource.
    Resource(RegisteredResource),
    /// A resource template.
    Template(RegisteredTemplate),
    /// A prompt.
    Prompt(RegisteredPrompt),
}

impl Registered {
    /// The component kind.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Tool(_) => ComponentKind::Tool,
            Self::Resource(_) => ComponentKind::Resource,
            Self::Template(_) => ComponentKind::ResourceTemplate,
            Self::Prompt(_) => ComponentKind::Prompt,
        }
    }

    /// The identifier this record is registered under.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Tool(r) => &r.tool.name,
            Self::Resource(r) => &r.resource.uri,
            Self::Template(r) => &r.template.uri_template,
            Self::Prompt(r) => &r.prompt.name,
        }
    }

    /// The server that first registered the handler.
    #[must_use]
    pub const fn owner(&self) -> &Owner {
        match self {
            Self::Tool(r) => &r.owner,
            Self::Resource(r) => &r.owner,
            Self::Template(r) => &r.owner,
            Self::Prompt(r) => &r.owner,
        }
    }

    /// The component metadata.
    #[must_use]
    pub fn meta(&self) -> ComponentMeta {
        match self {
            Self::Tool(r) => ComponentMeta::Tool(r.tool.clone()),
            Self::Resource(r) => ComponentMeta::Resource(r.resource.clone()),
            Self::Template(r) => ComponentMeta::ResourceTemplate(r.template.clone()),
            Self::Prompt(r) => ComponentMeta::Prompt(r.prompt.clone()),
        }
    }

    /// A copy under the prefixed identifier, sharing the handler.
    #[must_use]
    pub fn reprefixed(&self, rule: &PrefixRule) -> Self {
        match self {
            Self::Tool(r) => Self::Tool(r.reprefixed(rule)),
            Self::Resource(r) => Self::Resource(r.reprefixed(rule)),
            Self::Template(r) => Self::Template(r.reprefixed(rule)),
            Self::Prompt(r) => Self::Prompt(r.reprefixed(rule)),
        }
    }
}

/// All components registered directly on one server.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// Tools.
    pub tools: ToolService,
    /// Resources and templates.
    pub resources: ResourceService,
    /// Prompts.
    pub prompts: PromptService,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced.
    pub fn insert(&mut self, record: Registered) -> Option<Registered> {
        match record {
            Registered::Tool(r) => self.tools.insert(r).map(Registered::Tool),
            Registered::Resource(r) => self.resources.insert_resource(r).map(Registered::Resource),
            Registered::Template(r) => self.resources.insert_template(r).map(Registered::Template),
            Registered::Prompt(r) => self.prompts.insert(r).map(Registered::Prompt),
        }
    }

    /// Remove the component of `kind` registered under `identifier`.
    pub fn remove(&mut self, kind: ComponentKind, identifier: &str) -> Option<Registered> {
        match kind {
            ComponentKind::Tool => self.tools.remove(identifier).map(Registered::Tool),
            ComponentKind::Resource => self
                .resources
                .remove_resource(identifier)
                .map(Registered::Resource),
            ComponentKind::ResourceTemplate => self
                .resources
                .remove_template(identifier)
                .map(Registered::Template),
            ComponentKind::Prompt => self.prompts.remove(identifier).map(Registered::Prompt),
        }
    }

    /// Look up the record of `kind` registered under `identifier`.
    #[must_use]
    pub fn get(&self, kind: ComponentKind, identifier: &str) -> Option<Registered> {
        match kind {
            ComponentKind::Tool => self.tools.get(identifier).cloned().map(Registered::Tool),
            ComponentKind::Resource => self
                .resources
                .get_resource(identifier)
                .cloned()
                .map(Registered::Resource),
            ComponentKind::ResourceTemplate => self
                .resources
                .get_template(identifier)
                .cloned()
                .map(Registered::Template),
            ComponentKind::Prompt => self.prompts.get(identifier).cloned().map(Registered::Prompt),
        }
    }

    /// Every record, in a stable order: kind, then identifier.
    #[must_use]
    pub fn records(&self) -> Vec<Registered> {
        let mut records: Vec<Registered> = self
            .tools
            .records()
            .cloned()
            .map(Registered::Tool)
            .chain(self.resources.resource_records().cloned().map(Registered::Resource))
            .chain(self.resources.template_records().cloned().map(Registered::Template))
            .chain(self.prompts.records().cloned().map(Registered::Prompt))
            .collect();
        records.sort_by(|a, b| {
            (a.kind() as u8, a.identifier()).cmp(&(b.kind() as u8, b.identifier()))
        });
        records
    }

    /// Metadata of every component of `kind`, sorted by identifier.
    #[must_use]
    pub fn metas(&self, kind: ComponentKind) -> Vec<ComponentMeta> {
        match kind {
            ComponentKind::Tool => self
                .tools
                .list()
                .into_iter()
                .cloned()
                .map(ComponentMeta::Tool)
                .collect(),
            ComponentKind::Resource => self
                .resources
                .list_resources()
                .into_iter()
                .cloned()
                .map(ComponentMeta::Resource)
                .collect(),
            ComponentKind::ResourceTemplate => self
                .resources
                .list_templates()
                .into_iter()
                .cloned()
                .map(ComponentMeta::ResourceTemplate)
                .collect(),
            ComponentKind::Prompt => self
                .prompts
                .list()
                .into_iter()
                .cloned()
                .map(ComponentMeta::Prompt)
                .collect(),
        }
    }

    /// Total number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len() + self.resources.len() + self.prompts.len()
    }

    /// Check if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpmount_core::types::{Resource, ResourceContents, Tool, ToolOutput};

    #[test]
    fn test_records_are_ordered_by_kind() {
        let mut registry = Registry::new();
        registry.insert(Registered::Resource(RegisteredResource::new(
            Resource::new("data://x", "X"),
            Owner::detached("s"),
            |uri, _| async move { Ok(ResourceContents::text(uri, "")) },
        )));
        registry.insert(Registered::Tool(RegisteredTool::new(
            Tool::new("b"),
            Owner::detached("s"),
            |_, _| async { Ok(ToolOutput::text("")) },
        )));
        registry.insert(Registered::Tool(RegisteredTool::new(
            Tool::new("a"),
            Owner::detached("s"),
            |_, _| async { Ok(ToolOutput::text("")) },
        )));

        let ids: Vec<_> = registry
            .records()
            .iter()
            .map(|r| r.identifier().to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "data://x"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_remove_by_kind() {
        let mut registry = Registry::new();
        registry.insert(Registered::Tool(RegisteredTool::new(
            Tool::new("ping"),
            Owner::detached("s"),
            |_, _| async { Ok(ToolOutput::text("pong")) },
        )));
        assert!(registry.remove(ComponentKind::Prompt, "ping").is_none());
        assert!(registry.remove(ComponentKind::Tool, "ping").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_detached_owner_has_no_server() {
        let owner = Owner::detached("gone");
        assert_eq!(owner.name(), "gone");
        assert!(owner.server().is_none());
    }
}
