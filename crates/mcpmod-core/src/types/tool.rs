//! Tool types.
//!
//! Tools are functions a server exposes for assistants to invoke. Each tool
//! has a name, a description and a JSON Schema for its input.

use super::content::Content;
use serde::{Deserialize, Serialize};

/// A tool declaration.
///
/// # Example
///
/// ```rust
/// use mcpmod_core::types::Tool;
///
/// let tool = Tool::new("create-book")
///     .description("Create a new book")
///     .with_string_param("title", "Title of the book", true)
///     .with_enum_param("genre", "Genre of the book", &["horror", "romance"], true);
///
/// assert_eq!(tool.input_schema["required"], serde_json::json!(["title", "genre"]));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Unique name of the tool.
    pub name: String,
    /// Human-readable description of what the tool does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema defining the tool's input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
    /// Optional annotations providing hints about tool behavior.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

impl Tool {
    /// Create a new tool with an empty object schema.
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

    /// Replace the tool's input schema.
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

    /// Add a string parameter to the input schema.
    #[must_use]
    pub fn with_string_param(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.with_param(
            name.into(),
            serde_json::json!({
                "type": "string",
                "description": description.into()
            }),
            required,
        )
    }

    /// Add a string parameter restricted to a fixed set of values.
    #[must_use]
    pub fn with_enum_param(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
        required: bool,
    ) -> Self {
        self.with_param(
            name.into(),
            serde_json::json!({
                "type": "string",
                "description": description.into(),
                "enum": values
            }),
            required,
        )
    }

    /// Add a number parameter to the input schema.
    #[must_use]
    pub fn with_number_param(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.with_param(
            name.into(),
            serde_json::json!({
                "type": "number",
                "description": description.into()
            }),
            required,
        )
    }

    fn with_param(mut self, name: String, schema: serde_json::Value, required: bool) -> Self {
        if !self
            .input_schema
            .get("properties")
            .is_some_and(serde_json::Value::is_object)
        {
            self.input_schema["properties"] = serde_json::json!({});
        }
        self.input_schema["properties"][&name] = schema;
        if required {
            match self
                .input_schema
                .get_mut("required")
                .and_then(serde_json::Value::as_array_mut)
            {
                Some(list) => list.push(serde_json::Value::String(name)),
                None => self.input_schema["required"] = serde_json::json!([name]),
            }
        }
        self
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

    /// Annotations for a destructive tool.
    #[must_use]
    pub fn destructive() -> Self {
        Self {
            destructive_hint: Some(true),
            ..Default::default()
        }
    }
}

/// The result of calling a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CallToolResult {
    /// The content returned by the tool.
    pub content: Vec<Content>,
    /// If true, this result represents a tool-level error.
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

    /// Create a successful result holding pretty-printed JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::text(serde_json::to_string_pretty(value)?))
    }

    /// Create an error result, visible to the caller as content.
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
}

/// Response for listing tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// The list of available tools.
    pub tools: Vec<Tool>,
    /// Cursor for the next page, if more tools exist.
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Request parameters for calling a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolRequest {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments to pass to the tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

impl CallToolRequest {
    /// Create a call request.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments: Some(arguments),
        }
    }

    /// Get a string argument by key, if present and a string.
    #[must_use]
    pub fn string_argument(&self, key: &str) -> Option<&str> {
        self.arguments.as_ref()?.get(key)?.as_str()
    }
}
