//! Tool metadata and call results.
//!
//! A tool's `name` is its identifier for composition: import and mount
//! rename it, everything else is carried through untouched.

use super::content::Content;
use serde::{Deserialize, Serialize};

/// Metadata of a callable tool, as listed by `tools/list`.
///
/// # Example
///
/// ```rust
/// use mcpmount_core::types::Tool;
///
/// let lookup = Tool::new("lookup")
///     .description("Find a station by code")
///     .input_schema(serde_json::json!({
///         "type": "object",
///         "properties": { "code": { "type": "string" } }
///     }));
/// let prefixed = lookup.renamed("weather_lookup");
/// assert_eq!(prefixed.name, "weather_lookup");
/// assert_eq!(prefixed.input_schema, lookup.input_schema);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Identifier, unique within one server.
    pub name: String,
    /// Description shown to clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the arguments object.
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
    /// Behaviour hints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

impl Tool {
    /// Create a new tool with the given name and an empty object schema.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            annotations: None,
        }
    }

    /// Set the tool's description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the tool's input schema.
    #[must_use]
    pub fn input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Set the tool's annotations.
    #[must_use]
    pub fn annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }

    /// Return a copy of this tool exposed under a different name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// Hints about tool behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAnnotations {
    /// Human-readable title for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// If true, the tool only reads data.
    #[serde(rename = "readOnlyHint", skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    /// If true, the tool may perform destructive operations.
    #[serde(rename = "destructiveHint", skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    /// If true, repeated calls with the same input yield the same result.
    #[serde(rename = "idempotentHint", skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,
}

impl ToolAnnotations {
    /// Annotations for a read-only tool.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            read_only_hint: Some(true),
            ..Default::default()
        }
    }
}

/// The result of calling a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    /// The content returned by the tool.
    pub content: Vec<Content>,
    /// If true, this result represents an error the model can see.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// Create a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: None,
        }
    }

    /// Create an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: Some(true),
        }
    }

    /// Check if this result indicates an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Text of the first content item, if it is text.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(Content::as_text)
    }
}

/// Ergonomic output type for tool handlers.
///
/// Converts into [`CallToolResult`]; recoverable errors are reported to the
/// model with `isError: true` rather than as protocol errors.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    /// Successful output.
    Success(CallToolResult),
    /// Recoverable error, visible to the model.
    RecoverableError {
        /// The error message.
        message: String,
        /// An optional suggestion for how to fix the error.
        suggestion: Option<String>,
    },
}

impl ToolOutput {
    /// Create a text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Success(CallToolResult::text(text))
    }

    /// Create a JSON result.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::text(serde_json::to_string_pretty(value)?))
    }

    /// Create a recoverable error.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::RecoverableError {
            message: message.into(),
            suggestion: None,
        }
    }

    /// Create a recoverable error with a suggestion.
    #[must_use]
    pub fn error_with_suggestion(
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::RecoverableError {
            message: message.into(),
            suggestion: Some(suggestion.into()),
        }
    }
}

impl From<ToolOutput> for CallToolResult {
    fn from(output: ToolOutput) -> Self {
        match output {
            ToolOutput::Success(result) => result,
            ToolOutput::RecoverableError {
                message,
                suggestion,
            } => match suggestion {
                Some(sug) => Self::error(format!("{message}\n\nSuggestion: {sug}")),
                None => Self::error(message),
            },
        }
    }
}

/// Response for listing tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// The list of available tools.
    pub tools: Vec<Tool>,
}

/// Request parameters for calling a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolRequest {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments to pass to the tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renamed_keeps_metadata() {
        let tool = Tool::new("ping")
            .description("Health check")
            .annotations(ToolAnnotations::read_only());
        let renamed = tool.renamed("a_ping");

        assert_eq!(renamed.name, "a_ping");
        assert_eq!(renamed.description, tool.description);
        assert_eq!(renamed.annotations, tool.annotations);
    }

    #[test]
    fn test_tool_output_conversion() {
        let result: CallToolResult = ToolOutput::text("Success").into();
        assert!(!result.is_error());

        let result: CallToolResult =
            ToolOutput::error_with_suggestion("Invalid query", "Quote phrases").into();
        assert!(result.is_error());
        assert!(result.first_text().is_some_and(|t| t.contains("Suggestion")));
    }

    #[test]
    fn test_tool_serialization() {
        let json = serde_json::to_string(&Tool::new("test")).unwrap();
        assert!(json.contains("\"name\":\"test\""));
        assert!(json.contains("\"inputSchema\""));
    }
}
