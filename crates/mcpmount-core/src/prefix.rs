//! Identifier prefixing shared by import and mount.
//!
//! Tools and prompts are named `prefix + separator + name`. Resources and
//! resource templates put the prefix in front of the whole URI:
//! `prefix + separator + uri`, so `data://x` under `r` becomes `r+data://x`.
//!
//! An empty prefix leaves identifiers untouched. An empty separator
//! concatenates prefix and identifier directly.

use serde::{Deserialize, Serialize};

use crate::component::ComponentKind;

/// Default separator between a prefix and a tool name.
pub const DEFAULT_TOOL_SEPARATOR: &str = "_";
/// Default separator between a prefix and a resource URI.
pub const DEFAULT_RESOURCE_SEPARATOR: &str = "+";
/// Default separator between a prefix and a prompt name.
pub const DEFAULT_PROMPT_SEPARATOR: &str = "_";

/// Per-kind separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Separators {
    /// Separator for tool names.
    pub tool: String,
    /// Separator for resource URIs and templates.
    pub resource: String,
    /// Separator for prompt names.
    pub prompt: String,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL_SEPARATOR.to_string(),
            resource: DEFAULT_RESOURCE_SEPARATOR.to_string(),
            prompt: DEFAULT_PROMPT_SEPARATOR.to_string(),
        }
    }
}

impl Separators {
    /// Set the tool separator.
    #[must_use]
    pub fn with_tool(mut self, separator: impl Into<String>) -> Self {
        self.tool = separator.into();
        self
    }

    /// Set the resource separator.
    #[must_use]
    pub fn with_resource(mut self, separator: impl Into<String>) -> Self {
        self.resource = separator.into();
        self
    }

    /// Set the prompt separator.
    #[must_use]
    pub fn with_prompt(mut self, separator: impl Into<String>) -> Self {
        self.prompt = separator.into();
        self
    }

    /// The separator used for `kind`.
    #[must_use]
    pub fn for_kind(&self, kind: ComponentKind) -> &str {
        match kind {
            ComponentKind::Tool => &self.tool,
            ComponentKind::Resource | ComponentKind::ResourceTemplate => &self.resource,
            ComponentKind::Prompt => &self.prompt,
        }
    }
}

/// Compute the external identifier of `local` under `prefix`.
#[must_use]
pub fn apply_prefix(kind: ComponentKind, prefix: &str, separators: &Separators, local: &str) -> String {
    if prefix.is_empty() {
        return local.to_string();
    }
    let separator = separators.for_kind(kind);
    let mut out = String::with_capacity(prefix.len() + separator.len() + local.len());
    out.push_str(prefix);
    out.push_str(separator);
    out.push_str(local);
    out
}

/// Recover the local identifier from an external one.
///
/// Returns `None` when `external` does not start with `prefix` followed by
/// the separator for `kind`.
#[must_use]
pub fn strip_prefix<'a>(
    kind: ComponentKind,
    prefix: &str,
    separators: &Separators,
    external: &'a str,
) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(external);
    }
    external
        .strip_prefix(prefix)?
        .strip_prefix(separators.for_kind(kind))
}

/// A prefix together with its separators.
///
/// Mount bindings and import calls each carry one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PrefixRule {
    /// The prefix. May be empty.
    pub prefix: String,
    /// Separators used with it.
    #[serde(default)]
    pub separators: Separators,
}

impl PrefixRule {
    /// A rule using the default separators.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separators: Separators::default(),
        }
    }

    /// Replace the separators.
    #[must_use]
    pub fn with_separators(mut self, separators: Separators) -> Self {
        self.separators = separators;
        self
    }

    /// See [`apply_prefix`].
    #[must_use]
    pub fn apply(&self, kind: ComponentKind, local: &str) -> String {
        apply_prefix(kind, &self.prefix, &self.separators, local)
    }

    /// See [`strip_prefix`].
    #[must_use]
    pub fn strip<'a>(&self, kind: ComponentKind, external: &'a str) -> Option<&'a str> {
        strip_prefix(kind, &self.prefix, &self.separators, external)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_forms() {
        let seps = Separators::default();
        assert_eq!(apply_prefix(ComponentKind::Tool, "a", &seps, "ping"), "a_ping");
        assert_eq!(apply_prefix(ComponentKind::Prompt, "a", &seps, "greet"), "a_greet");
        assert_eq!(
            apply_prefix(ComponentKind::Resource, "r", &seps, "data://x"),
            "r+data://x"
        );
        assert_eq!(
            apply_prefix(ComponentKind::ResourceTemplate, "r", &seps, "users://{id}"),
            "r+users://{id}"
        );
    }

    #[test]
    fn test_round_trip() {
        let seps = Separators::default().with_tool("::").with_resource("");
        let cases = [
            (ComponentKind::Tool, "weather", "forecast"),
            (ComponentKind::Tool, "w", "a_b_c"),
            (ComponentKind::Resource, "docs", "file:///x/y.md"),
            (ComponentKind::ResourceTemplate, "u", "users://{id}/profile"),
            (ComponentKind::Prompt, "p", ""),
            (ComponentKind::Prompt, "", "bare"),
        ];
        for (kind, prefix, local) in cases {
            let external = apply_prefix(kind, prefix, &seps, local);
            assert_eq!(
                strip_prefix(kind, prefix, &seps, &external),
                Some(local),
                "{kind} {prefix:?} {local:?}"
            );
        }
    }

    #[test]
    fn test_empty_prefix_is_identity() {
        let seps = Separators::default();
        assert_eq!(apply_prefix(ComponentKind::Tool, "", &seps, "ping"), "ping");
        assert_eq!(strip_prefix(ComponentKind::Tool, "", &seps, "ping"), Some("ping"));
    }

    #[test]
    fn test_empty_separator_concatenates() {
        let seps = Separators::default().with_tool("");
        assert_eq!(apply_prefix(ComponentKind::Tool, "a", &seps, "ping"), "aping");
        assert_eq!(strip_prefix(ComponentKind::Tool, "a", &seps, "aping"), Some("ping"));
    }

    #[test]
    fn test_strip_rejects_foreign_identifiers() {
        let rule = PrefixRule::new("a");
        assert_eq!(rule.strip(ComponentKind::Tool, "ping"), None);
        assert_eq!(rule.strip(ComponentKind::Tool, "ab_ping"), None);
        assert_eq!(rule.strip(ComponentKind::Tool, "a+ping"), None);
        assert_eq!(rule.strip(ComponentKind::Resource, "a_data://x"), None);
    }

    #[test]
    fn test_separators_deserialize_with_defaults() {
        let seps: Separators = serde_json::from_str(r#"{"tool": "."}"#).unwrap();
        assert_eq!(seps.tool, ".");
        assert_eq!(seps.resource, DEFAULT_RESOURCE_SEPARATOR);
    }
}
