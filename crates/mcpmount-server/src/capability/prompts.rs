//! Prompt registry.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use mcpmount_core::component::ComponentKind;
use mcpmount_core::error::McpError;
use mcpmount_core::prefix::PrefixRule;
use mcpmount_core::types::{GetPromptResult, Prompt};
use serde_json::{Map, Value};

use super::Owner;
use crate::context::Context;

/// Prompt arguments as received on the wire.
pub type PromptArgs = Option<Map<String, Value>>;

/// The future returned by a stored prompt handler.
pub type PromptFuture<'a> =
    Pin<Box<dyn Future<Output = Result<GetPromptResult, McpError>> + Send + 'a>>;

/// A shared async function for rendering a prompt.
pub type BoxedPromptFn =
    Arc<dyn for<'a> Fn(PromptArgs, &'a Context<'a>) -> PromptFuture<'a> + Send + Sync>;

/// Wrap a closure as a [`BoxedPromptFn`].
pub fn boxed_prompt<F>(f: F) -> BoxedPromptFn
where
    F: for<'a> Fn(PromptArgs, &'a Context<'a>) -> PromptFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A registered prompt with metadata and handler.
#[derive(Clone)]
pub struct RegisteredPrompt {
    /// Prompt metadata. `prompt.name` is the identifier it is registered
    /// under.
    pub prompt: Prompt,
    /// Handler function.
    pub handler: BoxedPromptFn,
    /// The server that originally registered the handler.
    pub owner: Owner,
}

impl RegisteredPrompt {
    /// Register `handler`.
    pub fn new<F, Fut>(prompt: Prompt, owner: Owner, handler: F) -> Self
    where
        F: Fn(PromptArgs, &Context<'_>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GetPromptResult, McpError>> + Send + 'static,
    {
        let handler = boxed_prompt(move |args, ctx| Box::pin(handler(args, ctx)));
        Self {
            prompt,
            handler,
            owner,
        }
    }

    /// A copy under the prefixed name, sharing this handler.
    #[must_use]
    pub fn reprefixed(&self, rule: &PrefixRule) -> Self {
        Self {
            prompt: self
                .prompt
                .renamed(rule.apply(ComponentKind::Prompt, &self.prompt.name)),
            handler: Arc::clone(&self.handler),
            owner: self.owner.clone(),
        }
    }

    /// Render the prompt, checking required arguments first.
    pub async fn get(&self, arguments: PromptArgs, ctx: &Context<'_>) -> Result<GetPromptResult, McpError> {
        if let Some(declared) = &self.prompt.arguments {
            for arg in declared.iter().filter(|a| a.required == Some(true)) {
                let present = arguments.as_ref().is_some_and(|m| m.contains_key(&arg.name));
                if !present {
                    return Err(McpError::invalid_params(
                        "prompts/get",
                        format!("Missing required argument '{}' for prompt '{}'", arg.name, self.prompt.name),
                    ));
                }
            }
        }
        (self.handler)(arguments, ctx).await
    }
}

impl std::fmt::Debug for RegisteredPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredPrompt")
            .field("name", &self.prompt.name)
            .field("owner", &self.owner.name())
            .finish_non_exhaustive()
    }
}

/// Service for managing prompts.
#[derive(Debug, Clone, Default)]
pub struct PromptService {
    prompts: HashMap<String, RegisteredPrompt>,
}

impl PromptService {
    /// Create a new empty prompt service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prompt, returning the one it replaced.
    pub fn insert(&mut self, registered: RegisteredPrompt) -> Option<RegisteredPrompt> {
        self.prompts.insert(registered.prompt.name.clone(), registered)
    }

    /// Remove a prompt by name.
    pub fn remove(&mut self, name: &str) -> Option<RegisteredPrompt> {
        self.prompts.remove(name)
    }

    /// Get a prompt by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredPrompt> {
        self.prompts.get(name)
    }

    /// Check if a prompt exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.prompts.contains_key(name)
    }

    /// Get all registered prompts, sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<&Prompt> {
        let mut prompts: Vec<&Prompt> = self.prompts.values().map(|r| &r.prompt).collect();
        prompts.sort_by(|a, b| a.name.cmp(&b.name));
        prompts
    }

    /// Iterate over the registered records.
    pub fn records(&self) -> impl Iterator<Item = &RegisteredPrompt> {
        self.prompts.values()
    }

    /// Get the number of registered prompts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Check if the service has no prompts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpmount_core::protocol::RequestId;

    fn greet() -> RegisteredPrompt {
        RegisteredPrompt::new(
            Prompt::new("greet").required_arg("who", "Who to greet"),
            Owner::detached("child"),
            |args, _ctx| async move {
                let who = args
                    .as_ref()
                    .and_then(|m| m.get("who"))
                    .and_then(Value::as_str)
                    .unwrap_or("nobody")
                    .to_string();
                Ok(GetPromptResult::user(format!("Hello, {who}!")))
            },
        )
    }

    #[tokio::test]
    async fn test_render_with_arguments() {
        let id = RequestId::Number(1);
        let mut args = Map::new();
        args.insert("who".into(), Value::from("world"));

        let result = greet().get(Some(args), &Context::new(&id)).await.unwrap();
        assert_eq!(result.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let id = RequestId::Number(1);
        let err = greet().get(None, &Context::new(&id)).await.unwrap_err();
        assert!(err.to_string().contains("who"));
    }

    #[test]
    fn test_reprefixed_keeps_arguments() {
        let copy = greet().reprefixed(&PrefixRule::new("a"));
        assert_eq!(copy.prompt.name, "a_greet");
        assert_eq!(copy.prompt.arguments.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_list_is_sorted() {
        let mut service = PromptService::new();
        service.insert(greet());
        service.insert(greet().reprefixed(&PrefixRule::new("a")));
        let names: Vec<_> = service.list().into_iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a_greet", "greet"]);
    }
}
