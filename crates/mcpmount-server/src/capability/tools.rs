//! Tool registry.
//!
//! Handlers are stored behind an `Arc` so an imported copy of a tool shares
//! the exact handler of the original.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use mcpmount_core::component::ComponentKind;
use mcpmount_core::error::McpError;
use mcpmount_core::prefix::PrefixRule;
use mcpmount_core::types::{CallToolResult, Tool, ToolOutput};
use serde_json::Value;

use super::Owner;
use crate::context::Context;

/// The future returned by a stored tool handler.
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<CallToolResult, McpError>> + Send + 'a>>;

/// A shared async function for tool execution.
pub type BoxedToolFn =
    Arc<dyn for<'a> Fn(Value, &'a Context<'a>) -> ToolFuture<'a> + Send + Sync>;

/// Wrap a closure as a [`BoxedToolFn`].
pub fn boxed_tool<F>(f: F) -> BoxedToolFn
where
    F: for<'a> Fn(Value, &'a Context<'a>) -> ToolFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A registered tool with metadata and handler.
#[derive(Clone)]
pub struct RegisteredTool {
    /// Tool metadata. `tool.name` is the identifier it is registered under.
    pub tool: Tool,
    /// Handler function.
    pub handler: BoxedToolFn,
    /// The server that originally registered the handler.
    pub owner: Owner,
}

impl RegisteredTool {
    /// Register `handler`, which returns the ergonomic [`ToolOutput`].
    pub fn new<F, Fut>(tool: Tool, owner: Owner, handler: F) -> Self
    where
        F: Fn(Value, &Context<'_>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, McpError>> + Send + 'static,
    {
        let handler = boxed_tool(move |args, ctx| {
            let fut = handler(args, ctx);
            Box::pin(async move { fut.await.map(CallToolResult::from) })
        });
        Self {
            tool,
            handler,
            owner,
        }
    }

    /// A copy under the prefixed name, sharing this handler.
    #[must_use]
    pub fn reprefixed(&self, rule: &PrefixRule) -> Self {
        Self {
            tool: self.tool.renamed(rule.apply(ComponentKind::Tool, &self.tool.name)),
            handler: Arc::clone(&self.handler),
            owner: self.owner.clone(),
        }
    }

    /// Invoke the handler.
    pub async fn call(&self, arguments: Value, ctx: &Context<'_>) -> Result<CallToolResult, McpError> {
        (self.handler)(arguments, ctx).await
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.tool.name)
            .field("owner", &self.owner.name())
            .finish_non_exhaustive()
    }
}

/// Service for managing tools.
#[derive(Debug, Clone, Default)]
pub struct ToolService {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolService {
    /// Create a new empty tool service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tool, returning the one it replaced.
    pub fn insert(&mut self, registered: RegisteredTool) -> Option<RegisteredTool> {
        self.tools.insert(registered.tool.name.clone(), registered)
    }

    /// Remove a tool by name.
    pub fn remove(&mut self, name: &str) -> Option<RegisteredTool> {
        self.tools.remove(name)
    }

    /// Get a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Check if a tool exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all registered tools, sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<&Tool> {
        let mut tools: Vec<&Tool> = self.tools.values().map(|r| &r.tool).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Iterate over the registered records.
    pub fn records(&self) -> impl Iterator<Item = &RegisteredTool> {
        self.tools.values()
    }

    /// Get the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the service has no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpmount_core::protocol::RequestId;

    fn echo() -> RegisteredTool {
        RegisteredTool::new(Tool::new("echo"), Owner::detached("child"), |args, _ctx| async move {
            Ok(ToolOutput::text(args["text"].as_str().unwrap_or_default().to_string()))
        })
    }

    #[tokio::test]
    async fn test_register_and_call() {
        let mut service = ToolService::new();
        assert!(service.insert(echo()).is_none());
        assert!(service.contains("echo"));

        let id = RequestId::Number(1);
        let ctx = Context::new(&id);
        let result = service
            .get("echo")
            .unwrap()
            .call(serde_json::json!({"text": "hi"}), &ctx)
            .await
            .unwrap();
        assert_eq!(result.first_text(), Some("hi"));
    }

    #[tokio::test]
    async fn test_recoverable_error_is_a_result() {
        let tool = RegisteredTool::new(Tool::new("fail"), Owner::detached("s"), |_, _| async {
            Ok(ToolOutput::error("bad input"))
        });
        let id = RequestId::Number(1);
        let result = tool.call(Value::Null, &Context::new(&id)).await.unwrap();
        assert!(result.is_error());
    }

    #[test]
    fn test_reprefixed_shares_handler() {
        let original = echo();
        let copy = original.reprefixed(&PrefixRule::new("a"));
        assert_eq!(copy.tool.name, "a_echo");
        assert!(Arc::ptr_eq(&original.handler, &copy.handler));
        assert_eq!(copy.owner.name(), "child");
    }

    #[test]
    fn test_replace_returns_previous() {
        let mut service = ToolService::new();
        service.insert(echo());
        assert!(service.insert(echo()).is_some());
        assert_eq!(service.len(), 1);
        assert!(service.remove("echo").is_some());
        assert!(service.is_empty());
    }
}
