//! Resource and resource template registry.
//!
//! Static resources are keyed by URI. Templates are kept in registration
//! order and matched newest first, so a later template shadows an earlier
//! one that accepts the same URI.
//!
//! Every record remembers the literal text prepended to its URI since the
//! handler was first registered. Prefixing is pure prepending, so stripping
//! that literal from a request URI recovers the URI the handler expects.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use mcpmount_core::component::ComponentKind;
use mcpmount_core::error::McpError;
use mcpmount_core::prefix::PrefixRule;
use mcpmount_core::types::{ReadResourceResult, Resource, ResourceContents, ResourceTemplate};
use mcpmount_core::uri_template::UriTemplate;

use super::Owner;
use crate::context::Context;

/// The future returned by a stored resource handler.
pub type ResourceFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ReadResourceResult, McpError>> + Send + 'a>>;

/// A shared async function for reading a resource.
pub type BoxedResourceFn =
    Arc<dyn for<'a> Fn(String, &'a Context<'a>) -> ResourceFuture<'a> + Send + Sync>;

/// A shared async function for reading through a template.
///
/// Receives the URI and the template variable bindings.
pub type BoxedTemplateFn = Arc<
    dyn for<'a> Fn(String, HashMap<String, String>, &'a Context<'a>) -> ResourceFuture<'a>
        + Send
        + Sync,
>;

/// Wrap a closure as a [`BoxedResourceFn`].
pub fn boxed_resource<F>(f: F) -> BoxedResourceFn
where
    F: for<'a> Fn(String, &'a Context<'a>) -> ResourceFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`BoxedTemplateFn`].
pub fn boxed_template<F>(f: F) -> BoxedTemplateFn
where
    F: for<'a> Fn(String, HashMap<String, String>, &'a Context<'a>) -> ResourceFuture<'a>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

fn native<'u>(added: &str, uri: &'u str) -> &'u str {
    uri.strip_prefix(added).unwrap_or(uri)
}

/// A registered resource with metadata and handler.
#[derive(Clone)]
pub struct RegisteredResource {
    /// Resource metadata. `resource.uri` is the identifier it is
    /// registered under.
    pub resource: Resource,
    /// Handler function for reading.
    pub handler: BoxedResourceFn,
    /// The server that originally registered the handler.
    pub owner: Owner,
    added: String,
}

impl RegisteredResource {
    /// Register `handler`, which produces a single contents entry.
    pub fn new<F, Fut>(resource: Resource, owner: Owner, handler: F) -> Self
    where
        F: Fn(String, &Context<'_>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResourceContents, McpError>> + Send + 'static,
    {
        let handler = boxed_resource(move |uri, ctx| {
            let fut = handler(uri, ctx);
            Box::pin(async move {
                Ok(ReadResourceResult {
                    contents: vec![fut.await?],
                })
            })
        });
        Self::from_handler(resource, owner, handler)
    }

    /// Build a record around an existing handler.
    #[must_use]
    pub fn from_handler(resource: Resource, owner: Owner, handler: BoxedResourceFn) -> Self {
        Self {
            resource,
            handler,
            owner,
            added: String::new(),
        }
    }

    /// A copy under the prefixed URI, sharing this handler.
    #[must_use]
    pub fn reprefixed(&self, rule: &PrefixRule) -> Self {
        let literal = rule.apply(ComponentKind::Resource, "");
        Self {
            resource: self
                .resource
                .with_uri(rule.apply(ComponentKind::Resource, &self.resource.uri)),
            handler: Arc::clone(&self.handler),
            owner: self.owner.clone(),
            added: literal + &self.added,
        }
    }

    /// Read the resource addressed by `uri`.
    pub async fn read(&self, uri: &str, ctx: &Context<'_>) -> Result<ReadResourceResult, McpError> {
        (self.handler)(native(&self.added, uri).to_owned(), ctx).await
    }
}

impl std::fmt::Debug for RegisteredResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredResource")
            .field("uri", &self.resource.uri)
            .field("owner", &self.owner.name())
            .finish_non_exhaustive()
    }
}

/// A registered resource template.
#[derive(Clone)]
pub struct RegisteredTemplate {
    /// Template metadata. `template.uri_template` is the identifier it is
    /// registered under.
    pub template: ResourceTemplate,
    /// Handler function for reading with URI parameters.
    pub handler: BoxedTemplateFn,
    /// The server that originally registered the handler.
    pub owner: Owner,
    matcher: UriTemplate,
    added: String,
}

impl RegisteredTemplate {
    /// Register `handler`, which receives the variable bindings.
    pub fn new<F, Fut>(template: ResourceTemplate, owner: Owner, handler: F) -> Self
    where
        F: Fn(String, HashMap<String, String>, &Context<'_>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResourceContents, McpError>> + Send + 'static,
    {
        let handler = boxed_template(move |uri, params, ctx| {
            let fut = handler(uri, params, ctx);
            Box::pin(async move {
                Ok(ReadResourceResult {
                    contents: vec![fut.await?],
                })
            })
        });
        Self::from_handler(template, owner, handler)
    }

    /// Build a record around an existing handler.
    #[must_use]
    pub fn from_handler(template: ResourceTemplate, owner: Owner, handler: BoxedTemplateFn) -> Self {
        Self {
            matcher: UriTemplate::parse(&template.uri_template),
            template,
            handler,
            owner,
            added: String::new(),
        }
    }

    /// A copy under the prefixed pattern, sharing this handler.
    #[must_use]
    pub fn reprefixed(&self, rule: &PrefixRule) -> Self {
        let literal = rule.apply(ComponentKind::ResourceTemplate, "");
        let pattern = rule.apply(ComponentKind::ResourceTemplate, &self.template.uri_template);
        Self {
            matcher: UriTemplate::parse(&pattern),
            template: self.template.with_uri_template(pattern),
            handler: Arc::clone(&self.handler),
            owner: self.owner.clone(),
            added: literal + &self.added,
        }
    }

    /// Match `uri` against this template.
    #[must_use]
    pub fn matches(&self, uri: &str) -> Option<HashMap<String, String>> {
        self.matcher.matches(uri)
    }

    /// Read `uri` through this template.
    pub async fn read(&self, uri: &str, ctx: &Context<'_>) -> Result<ReadResourceResult, McpError> {
        let params = self
            .matches(uri)
            .ok_or_else(|| McpError::not_found(ComponentKind::ResourceTemplate, uri))?;
        (self.handler)(native(&self.added, uri).to_owned(), params, ctx).await
    }
}

impl std::fmt::Debug for RegisteredTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTemplate")
            .field("uri_template", &self.template.uri_template)
            .field("owner", &self.owner.name())
            .finish_non_exhaustive()
    }
}

/// Service for managing resources and resource templates.
#[derive(Debug, Clone, Default)]
pub struct ResourceService {
    resources: HashMap<String, RegisteredResource>,
    templates: Vec<RegisteredTemplate>,
}

impl ResourceService {
    /// Create a new empty resource service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a static resource, returning the one it replaced.
    pub fn insert_resource(&mut self, registered: RegisteredResource) -> Option<RegisteredResource> {
        self.resources
            .insert(registered.resource.uri.clone(), registered)
    }

    /// Insert a template, returning the one with the same pattern it
    /// replaced. The new template becomes the newest.
    pub fn insert_template(&mut self, registered: RegisteredTemplate) -> Option<RegisteredTemplate> {
        let previous = self.remove_template(&registered.template.uri_template);
        self.templates.push(registered);
        previous
    }

    /// Remove a static resource by URI.
    pub fn remove_resource(&mut self, uri: &str) -> Option<RegisteredResource> {
        self.resources.remove(uri)
    }

    /// Remove a template by pattern.
    pub fn remove_template(&mut self, pattern: &str) -> Option<RegisteredTemplate> {
        let index = self
            .templates
            .iter()
            .position(|t| t.template.uri_template == pattern)?;
        Some(self.templates.remove(index))
    }

    /// Get a static resource by exact URI.
    #[must_use]
    pub fn get_resource(&self, uri: &str) -> Option<&RegisteredResource> {
        self.resources.get(uri)
    }

    /// Get a template by exact pattern.
    #[must_use]
    pub fn get_template(&self, pattern: &str) -> Option<&RegisteredTemplate> {
        self.templates
            .iter()
            .find(|t| t.template.uri_template == pattern)
    }

    /// Find the newest template that accepts `uri`.
    #[must_use]
    pub fn match_template(&self, uri: &str) -> Option<&RegisteredTemplate> {
        self.templates.iter().rev().find(|t| t.matches(uri).is_some())
    }

    /// Get all static resources, sorted by URI.
    #[must_use]
    pub fn list_resources(&self) -> Vec<&Resource> {
        let mut resources: Vec<&Resource> = self.resources.values().map(|r| &r.resource).collect();
        resources.sort_by(|a, b| a.uri.cmp(&b.uri));
        resources
    }

    /// Get all templates, sorted by pattern.
    #[must_use]
    pub fn list_templates(&self) -> Vec<&ResourceTemplate> {
        let mut templates: Vec<&ResourceTemplate> =
            self.templates.iter().map(|t| &t.template).collect();
        templates.sort_by(|a, b| a.uri_template.cmp(&b.uri_template));
        templates
    }

    /// Iterate over static resource records.
    pub fn resource_records(&self) -> impl Iterator<Item = &RegisteredResource> {
        self.resources.values()
    }

    /// Iterate over template records, oldest first.
    pub fn template_records(&self) -> impl Iterator<Item = &RegisteredTemplate> {
        self.templates.iter()
    }

    /// Total number of resources and templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len() + self.templates.len()
    }

    /// Check if the service has neither resources nor templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.templates.is_empty()
    }
}
