//! Delegation dispatcher and aggregated listing.
//!
//! A request is resolved in two steps:
//!
//! 1. The server's own registry. Resources check static URIs before
//!    templates.
//! 2. The mount list, newest binding first. The first binding whose prefix
//!    and separator match the identifier takes the request; the prefix is
//!    stripped and the rest is forwarded to the subserver, which resolves
//!    it the same way.
//!
//! Exactly one mount is tried and failures are not retried elsewhere. An
//! identifier nothing claims yields `NotFound`.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use mcpmount_core::component::{ComponentKind, ComponentMeta, ComponentRequest, ComponentResponse};
use mcpmount_core::error::McpError;
use mcpmount_core::protocol::RequestId;
use mcpmount_core::types::{
    CallToolResult, GetPromptResult, Prompt, ReadResourceResult, Resource, ResourceTemplate, Tool,
};
use serde_json::{Map, Value};
use tracing::{trace, warn};
use uuid::Uuid;

use crate::capability::Registered;
use crate::context::Context;
use crate::mount::{MountTarget, claim, claims};
use crate::server::Server;

impl Server {
    /// Resolve and execute one component request.
    pub fn dispatch<'a>(
        &'a self,
        request: ComponentRequest,
        ctx: &'a Context<'a>,
    ) -> BoxFuture<'a, Result<ComponentResponse, McpError>> {
        Box::pin(async move {
            if let Some(record) = self.lookup(&request) {
                trace!(server = self.name(), identifier = request.identifier(), "local hit");
                return invoke(record, request, ctx).await;
            }

            let kind = request.kind();
            let mounts = self.mounts();
            let Some((mount, local)) = claim(&mounts, kind, request.identifier()) else {
                return Err(McpError::not_found(kind, request.identifier()));
            };
            let external = request.identifier().to_owned();
            let local = local.to_owned();
            trace!(
                server = self.name(),
                prefix = mount.prefix(),
                %external,
                %local,
                "forwarding to mount"
            );

            let forwarded = request.with_identifier(local.clone());
            let result = match mount.target() {
                MountTarget::Direct(child) => child.dispatch(forwarded, ctx).await,
                MountTarget::Proxy(link) => link.call(forwarded, ctx.cancellation_token()).await,
            };
            result.map_err(|err| rename_not_found(err, &local, &external))
        })
    }

    fn lookup(&self, request: &ComponentRequest) -> Option<Registered> {
        let registry = self.registry();
        match request {
            ComponentRequest::CallTool { name, .. } => {
                registry.tools.get(name).cloned().map(Registered::Tool)
            }
            ComponentRequest::ReadResource { uri } => registry
                .resources
                .get_resource(uri)
                .cloned()
                .map(Registered::Resource)
                .or_else(|| {
                    registry
                        .resources
                        .match_template(uri)
                        .cloned()
                        .map(Registered::Template)
                }),
            ComponentRequest::GetPrompt { name, .. } => {
                registry.prompts.get(name).cloned().map(Registered::Prompt)
            }
        }
    }

    /// Build a request from `(kind, identifier, args)` and dispatch it with
    /// a fresh context.
    pub async fn dispatch_parts(
        &self,
        kind: ComponentKind,
        identifier: &str,
        args: Value,
    ) -> Result<ComponentResponse, McpError> {
        let request = ComponentRequest::from_parts(kind, identifier, args)?;
        let id = local_request_id();
        let ctx = Context::new(&id);
        self.dispatch(request, &ctx).await
    }

    /// Call a tool by its external name.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        let id = local_request_id();
        let ctx = Context::new(&id);
        self.dispatch(ComponentRequest::call_tool(name, arguments), &ctx)
            .await?
            .into_tool()
    }

    /// Read a resource by its external URI.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        let id = local_request_id();
        let ctx = Context::new(&id);
        self.dispatch(ComponentRequest::read_resource(uri), &ctx)
            .await?
            .into_resource()
    }

    /// Render a prompt by its external name.
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<GetPromptResult, McpError> {
        let id = local_request_id();
        let ctx = Context::new(&id);
        self.dispatch(ComponentRequest::get_prompt(name, arguments), &ctx)
            .await?
            .into_prompt()
    }

    /// Every component of `kind` this server exposes, under external
    /// identifiers and sorted by them.
    ///
    /// A mounted component is listed only if its external identifier would
    /// be dispatched to that mount, so a binding shadowed by a newer one
    /// with a matching prefix contributes nothing. The server's own
    /// components override mounted ones. A proxy mount
    /// lists through its session; a mount that fails to list is logged and
    /// skipped.
    pub fn list(&self, kind: ComponentKind) -> BoxFuture<'_, Result<Vec<ComponentMeta>, McpError>> {
        Box::pin(async move {
            let mut merged: BTreeMap<String, ComponentMeta> = BTreeMap::new();

            let mounts = self.mounts();
            for mount in mounts.iter() {
                let listed = match mount.target() {
                    MountTarget::Direct(child) => child.list(kind).await,
                    MountTarget::Proxy(link) => link.list(kind).await,
                };
                let metas = match listed {
                    Ok(metas) => metas,
                    Err(err) => {
                        warn!(
                            server = self.name(),
                            prefix = mount.prefix(),
                            %kind,
                            error = %err,
                            "skipping mount that failed to list"
                        );
                        continue;
                    }
                };
                for meta in metas {
                    let external = mount.rule().apply(kind, meta.identifier());
                    if claims(&mounts, mount, kind, &external) {
                        merged.insert(external.clone(), meta.renamed(external));
                    }
                }
            }

            for meta in self.components(kind) {
                merged.insert(meta.identifier().to_owned(), meta);
            }
            Ok(merged.into_values().collect())
        })
    }

    /// Aggregated tool listing.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        Ok(self
            .list(ComponentKind::Tool)
            .await?
            .into_iter()
            .filter_map(|m| match m {
                ComponentMeta::Tool(t) => Some(t),
                _ => None,
            })
            .collect())
    }

    /// Aggregated resource listing.
    pub async fn list_resources(&self) -> Result<Vec<Resource>, McpError> {
        Ok(self
            .list(ComponentKind::Resource)
            .await?
            .into_iter()
            .filter_map(|m| match m {
                ComponentMeta::Resource(r) => Some(r),
                _ => None,
            })
            .collect())
    }

    /// Aggregated resource template listing.
    pub async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>, McpError> {
        Ok(self
            .list(ComponentKind::ResourceTemplate)
            .await?
            .into_iter()
            .filter_map(|m| match m {
                ComponentMeta::ResourceTemplate(t) => Some(t),
                _ => None,
            })
            .collect())
    }

    /// Aggregated prompt listing.
    pub async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError> {
        Ok(self
            .list(ComponentKind::Prompt)
            .await?
            .into_iter()
            .filter_map(|m| match m {
                ComponentMeta::Prompt(p) => Some(p),
                _ => None,
            })
            .collect())
    }
}

async fn invoke(
    record: Registered,
    request: ComponentRequest,
    ctx: &Context<'_>,
) -> Result<ComponentResponse, McpError> {
    match (record, request) {
        (Registered::Tool(tool), ComponentRequest::CallTool { arguments, .. }) => {
            tool.call(arguments, ctx).await.map(ComponentResponse::Tool)
        }
        (Registered::Resource(resource), ComponentRequest::ReadResource { uri }) => {
            resource.read(&uri, ctx).await.map(ComponentResponse::Resource)
        }
        (Registered::Template(template), ComponentRequest::ReadResource { uri }) => {
            template.read(&uri, ctx).await.map(ComponentResponse::Resource)
        }
        (Registered::Prompt(prompt), ComponentRequest::GetPrompt { arguments, .. }) => {
            prompt.get(arguments, ctx).await.map(ComponentResponse::Prompt)
        }
        (record, request) => Err(McpError::internal(format!(
            "{} record cannot serve {}",
            record.kind(),
            request.method()
        ))),
    }
}

/// A `NotFound` for the forwarded identifier is reported under the
/// identifier the caller used.
fn rename_not_found(err: McpError, forwarded: &str, external: &str) -> McpError {
    match err {
        McpError::NotFound { kind, identifier } if identifier == forwarded => {
            McpError::not_found(kind, external)
        }
        other => other,
    }
}

fn local_request_id() -> RequestId {
    RequestId::String(Uuid::new_v4().to_string())
}
