//! Component kinds and the request/response envelope used by dispatch.
//!
//! A [`ComponentRequest`] is what travels through a composed server: the
//! dispatcher only needs to read and rewrite its identifier, so the same
//! value is handed to direct mounts and encoded for proxy sessions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::McpError;
use crate::types::{
    CallToolRequest, CallToolResult, GetPromptRequest, GetPromptResult, ListPromptsResult,
    ListResourceTemplatesResult, ListResourcesResult, ListToolsResult, Prompt,
    ReadResourceRequest, ReadResourceResult, Resource, ResourceTemplate, Tool,
};

/// The four kinds of component a server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// A callable tool, identified by name.
    Tool,
    /// A concrete resource, identified by URI.
    Resource,
    /// A parameterized resource, identified by URI pattern.
    ResourceTemplate,
    /// A prompt, identified by name.
    Prompt,
}

impl ComponentKind {
    /// Every kind, in listing order.
    pub const ALL: [Self; 4] = [
        Self::Tool,
        Self::Resource,
        Self::ResourceTemplate,
        Self::Prompt,
    ];

    /// The wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Resource => "resource",
            Self::ResourceTemplate => "resource_template",
            Self::Prompt => "prompt",
        }
    }

    /// True for kinds identified by URI rather than by name.
    #[must_use]
    pub const fn is_uri(self) -> bool {
        matches!(self, Self::Resource | Self::ResourceTemplate)
    }

    /// The JSON-RPC method that lists components of this kind.
    #[must_use]
    pub const fn list_method(self) -> &'static str {
        match self {
            Self::Tool => "tools/list",
            Self::Resource => "resources/list",
            Self::ResourceTemplate => "resources/templates/list",
            Self::Prompt => "prompts/list",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of one component, whatever its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentMeta {
    /// A tool definition.
    Tool(Tool),
    /// A concrete resource.
    Resource(Resource),
    /// A resource template.
    ResourceTemplate(ResourceTemplate),
    /// A prompt definition.
    Prompt(Prompt),
}

impl ComponentMeta {
    /// The kind of this component.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Tool(_) => ComponentKind::Tool,
            Self::Resource(_) => ComponentKind::Resource,
            Self::ResourceTemplate(_) => ComponentKind::ResourceTemplate,
            Self::Prompt(_) => ComponentKind::Prompt,
        }
    }

    /// Name, URI or URI pattern, depending on kind.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Tool(t) => &t.name,
            Self::Resource(r) => &r.uri,
            Self::ResourceTemplate(t) => &t.uri_template,
            Self::Prompt(p) => &p.name,
        }
    }

    /// A copy with a different identifier and all other metadata kept.
    #[must_use]
    pub fn renamed(&self, identifier: impl Into<String>) -> Self {
        match self {
            Self::Tool(t) => Self::Tool(t.renamed(identifier)),
            Self::Resource(r) => Self::Resource(r.with_uri(identifier)),
            Self::ResourceTemplate(t) => Self::ResourceTemplate(t.with_uri_template(identifier)),
            Self::Prompt(p) => Self::Prompt(p.renamed(identifier)),
        }
    }

    /// Encode a listing of `kind` as the result of its list method.
    ///
    /// Entries of another kind are skipped.
    pub fn to_list_result(kind: ComponentKind, metas: &[Self]) -> Result<Value, McpError> {
        let value = match kind {
            ComponentKind::Tool => serde_json::to_value(ListToolsResult {
                tools: metas
                    .iter()
                    .filter_map(|m| match m {
                        Self::Tool(t) => Some(t.clone()),
                        _ => None,
                    })
                    .collect(),
            })?,
            ComponentKind::Resource => serde_json::to_value(ListResourcesResult {
                resources: metas
                    .iter()
                    .filter_map(|m| match m {
                        Self::Resource(r) => Some(r.clone()),
                        _ => None,
                    })
                    .collect(),
            })?,
            ComponentKind::ResourceTemplate => {
                serde_json::to_value(ListResourceTemplatesResult {
                    resource_templates: metas
                        .iter()
                        .filter_map(|m| match m {
                            Self::ResourceTemplate(t) => Some(t.clone()),
                            _ => None,
                        })
                        .collect(),
                })?
            }
            ComponentKind::Prompt => serde_json::to_value(ListPromptsResult {
                prompts: metas
                    .iter()
                    .filter_map(|m| match m {
                        Self::Prompt(p) => Some(p.clone()),
                        _ => None,
                    })
                    .collect(),
            })?,
        };
        Ok(value)
    }

    /// Decode the result of a list method back into metadata.
    pub fn from_list_result(kind: ComponentKind, value: Value) -> Result<Vec<Self>, McpError> {
        let metas = match kind {
            ComponentKind::Tool => serde_json::from_value::<ListToolsResult>(value)?
                .tools
                .into_iter()
                .map(Self::Tool)
                .collect(),
            ComponentKind::Resource => serde_json::from_value::<ListResourcesResult>(value)?
                .resources
                .into_iter()
                .map(Self::Resource)
                .collect(),
            ComponentKind::ResourceTemplate => {
                serde_json::from_value::<ListResourceTemplatesResult>(value)?
                    .resource_templates
                    .into_iter()
                    .map(Self::ResourceTemplate)
                    .collect()
            }
            ComponentKind::Prompt => serde_json::from_value::<ListPromptsResult>(value)?
                .prompts
                .into_iter()
                .map(Self::Prompt)
                .collect(),
        };
        Ok(metas)
    }
}

/// A request addressed to one component.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentRequest {
    /// `tools/call`.
    CallTool {
        /// Tool name.
        name: String,
        /// Tool arguments.
        arguments: Value,
    },
    /// `resources/read`. Also serves resource templates.
    ReadResource {
        /// Resource URI.
        uri: String,
    },
    /// `prompts/get`.
    GetPrompt {
        /// Prompt name.
        name: String,
        /// Prompt arguments.
        arguments: Option<Map<String, Value>>,
    },
}

impl ComponentRequest {
    /// Build a tool call.
    pub fn call_tool(name: impl Into<String>, arguments: Value) -> Self {
        Self::CallTool {
            name: name.into(),
            arguments,
        }
    }

    /// Build a resource read.
    pub fn read_resource(uri: impl Into<String>) -> Self {
        Self::ReadResource { uri: uri.into() }
    }

    /// Build a prompt fetch.
    pub fn get_prompt(name: impl Into<String>, arguments: Option<Map<String, Value>>) -> Self {
        Self::GetPrompt {
            name: name.into(),
            arguments,
        }
    }

    /// Build a request from a `(kind, identifier, args)` triple.
    ///
    /// Template reads are ordinary resource reads; `args` is ignored for
    /// them. Prompt arguments must be an object or null.
    pub fn from_parts(kind: ComponentKind, identifier: &str, args: Value) -> Result<Self, McpError> {
        match kind {
            ComponentKind::Tool => Ok(Self::call_tool(identifier, args)),
            ComponentKind::Resource | ComponentKind::ResourceTemplate => {
                Ok(Self::read_resource(identifier))
            }
            ComponentKind::Prompt => match args {
                Value::Null => Ok(Self::get_prompt(identifier, None)),
                Value::Object(map) => Ok(Self::get_prompt(identifier, Some(map))),
                other => Err(McpError::invalid_params(
                    "prompts/get",
                    format!("prompt arguments must be an object, got {other}"),
                )),
            },
        }
    }

    /// The kind this request is resolved against first.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::CallTool { .. } => ComponentKind::Tool,
            Self::ReadResource { .. } => ComponentKind::Resource,
            Self::GetPrompt { .. } => ComponentKind::Prompt,
        }
    }

    /// The identifier being addressed.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::CallTool { name, .. } | Self::GetPrompt { name, .. } => name,
            Self::ReadResource { uri } => uri,
        }
    }

    /// The same request addressed to a different identifier.
    #[must_use]
    pub fn with_identifier(self, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        match self {
            Self::CallTool { arguments, .. } => Self::CallTool {
                name: identifier,
                arguments,
            },
            Self::ReadResource { .. } => Self::ReadResource { uri: identifier },
            Self::GetPrompt { arguments, .. } => Self::GetPrompt {
                name: identifier,
                arguments,
            },
        }
    }

    /// The JSON-RPC method for this request.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::CallTool { .. } => "tools/call",
            Self::ReadResource { .. } => "resources/read",
            Self::GetPrompt { .. } => "prompts/get",
        }
    }

    /// Encode the request parameters.
    pub fn to_params(&self) -> Result<Value, McpError> {
        let params = match self {
            Self::CallTool { name, arguments } => serde_json::to_value(CallToolRequest {
                name: name.clone(),
                arguments: Some(arguments.clone()),
            })?,
            Self::ReadResource { uri } => {
                serde_json::to_value(ReadResourceRequest { uri: uri.clone() })?
            }
            Self::GetPrompt { name, arguments } => serde_json::to_value(GetPromptRequest {
                name: name.clone(),
                arguments: arguments.clone(),
            })?,
        };
        Ok(params)
    }

    /// Decode a request from a JSON-RPC method and its parameters.
    ///
    /// Returns `Ok(None)` for methods that are not component requests.
    pub fn from_request(method: &str, params: Option<&Value>) -> Result<Option<Self>, McpError> {
        let params = params.cloned().unwrap_or(Value::Null);
        let decode_err = |e: serde_json::Error| McpError::invalid_params_with_source(method, e);

        let request = match method {
            "tools/call" => {
                let req: CallToolRequest = serde_json::from_value(params).map_err(decode_err)?;
                Self::call_tool(req.name, req.arguments.unwrap_or_else(|| Value::Object(Map::new())))
            }
            "resources/read" => {
                let req: ReadResourceRequest =
                    serde_json::from_value(params).map_err(decode_err)?;
                Self::read_resource(req.uri)
            }
            "prompts/get" => {
                let req: GetPromptRequest = serde_json::from_value(params).map_err(decode_err)?;
                Self::get_prompt(req.name, req.arguments)
            }
            _ => return Ok(None),
        };
        Ok(Some(request))
    }
}

/// The result of a [`ComponentRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentResponse {
    /// Result of `tools/call`.
    Tool(CallToolResult),
    /// Result of `resources/read`.
    Resource(ReadResourceResult),
    /// Result of `prompts/get`.
    Prompt(GetPromptResult),
}

impl ComponentResponse {
    /// Encode the response as a JSON-RPC result value.
    pub fn to_value(&self) -> Result<Value, McpError> {
        let value = match self {
            Self::Tool(r) => serde_json::to_value(r)?,
            Self::Resource(r) => serde_json::to_value(r)?,
            Self::Prompt(r) => serde_json::to_value(r)?,
        };
        Ok(value)
    }

    /// Decode the response to `request` from a JSON-RPC result value.
    pub fn from_value(request: &ComponentRequest, value: Value) -> Result<Self, McpError> {
        let response = match request {
            ComponentRequest::CallTool { .. } => Self::Tool(serde_json::from_value(value)?),
            ComponentRequest::ReadResource { .. } => Self::Resource(serde_json::from_value(value)?),
            ComponentRequest::GetPrompt { .. } => Self::Prompt(serde_json::from_value(value)?),
        };
        Ok(response)
    }

    /// Unwrap a tool result.
    pub fn into_tool(self) -> Result<CallToolResult, McpError> {
        match self {
            Self::Tool(r) => Ok(r),
            other => Err(mismatch("tool", &other)),
        }
    }

    /// Unwrap a resource result.
    pub fn into_resource(self) -> Result<ReadResourceResult, McpError> {
        match self {
            Self::Resource(r) => Ok(r),
            other => Err(mismatch("resource", &other)),
        }
    }

    /// Unwrap a prompt result.
    pub fn into_prompt(self) -> Result<GetPromptResult, McpError> {
        match self {
            Self::Prompt(r) => Ok(r),
            other => Err(mismatch("prompt", &other)),
        }
    }
}

fn mismatch(expected: &str, got: &ComponentResponse) -> McpError {
    let got = match got {
        ComponentResponse::Tool(_) => "tool",
        ComponentResponse::Resource(_) => "resource",
        ComponentResponse::Prompt(_) => "prompt",
    };
    McpError::internal(format!("expected a {expected} result, got a {got} result"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(
            serde_json::to_value(ComponentKind::ResourceTemplate).unwrap(),
            json!("resource_template")
        );
        assert_eq!(ComponentKind::Tool.to_string(), "tool");
        assert!(ComponentKind::Resource.is_uri());
        assert!(!ComponentKind::Prompt.is_uri());
    }

    #[test]
    fn test_with_identifier_keeps_arguments() {
        let req = ComponentRequest::call_tool("a_add", json!({"x": 1}));
        let forwarded = req.with_identifier("add");
        assert_eq!(forwarded, ComponentRequest::call_tool("add", json!({"x": 1})));
    }

    #[test]
    fn test_request_decoding() {
        let params = json!({"name": "greet", "arguments": {"who": "world"}});
        let req = ComponentRequest::from_request("prompts/get", Some(&params))
            .unwrap()
            .unwrap();
        assert_eq!(req.kind(), ComponentKind::Prompt);
        assert_eq!(req.identifier(), "greet");

        assert!(ComponentRequest::from_request("ping", None).unwrap().is_none());
        assert!(ComponentRequest::from_request("tools/call", Some(&json!(3))).is_err());
    }

    #[test]
    fn test_from_parts_template_is_a_read() {
        let req =
            ComponentRequest::from_parts(ComponentKind::ResourceTemplate, "users://7", Value::Null)
                .unwrap();
        assert_eq!(req, ComponentRequest::read_resource("users://7"));
        assert!(ComponentRequest::from_parts(ComponentKind::Prompt, "p", json!([1])).is_err());
    }

    #[test]
    fn test_meta_rename() {
        let meta = ComponentMeta::Resource(Resource::new("data://x", "X"));
        let renamed = meta.renamed("r+data://x");
        assert_eq!(renamed.identifier(), "r+data://x");
        assert_eq!(renamed.kind(), ComponentKind::Resource);
    }

    #[test]
    fn test_list_result_wire_shape() {
        let metas = vec![
            ComponentMeta::ResourceTemplate(ResourceTemplate::new("r+users://{id}", "User")),
            ComponentMeta::Tool(Tool::new("ping")),
        ];
        let value = ComponentMeta::to_list_result(ComponentKind::ResourceTemplate, &metas).unwrap();
        assert_eq!(value["resourceTemplates"][0]["uriTemplate"], "r+users://{id}");

        let back = ComponentMeta::from_list_result(ComponentKind::ResourceTemplate, value).unwrap();
        assert_eq!(back, vec![metas[0].clone()]);
    }

    #[test]
    fn test_response_mismatch() {
        let resp = ComponentResponse::Tool(CallToolResult::text("pong"));
        assert!(resp.clone().into_prompt().is_err());
        assert_eq!(resp.into_tool().unwrap().first_text(), Some("pong"));
    }
}
