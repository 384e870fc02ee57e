//! Prompt types.
//!
//! Prompts are templated messages a server offers, parameterized by named
//! string arguments.

use super::content::{Content, Role};
use serde::{Deserialize, Serialize};

/// A prompt declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Unique name of the prompt.
    pub name: String,
    /// Human-readable description of what the prompt does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arguments that the prompt accepts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<PromptArgument>>,
}

impl Prompt {
    /// Create a new prompt with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: None,
        }
    }

    /// Set the prompt description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an argument to the prompt.
    #[must_use]
    pub fn argument(mut self, arg: PromptArgument) -> Self {
        self.arguments.get_or_insert_with(Vec::new).push(arg);
        self
    }

    /// Add a required string argument.
    #[must_use]
    pub fn required_arg(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.argument(PromptArgument::required(name, description))
    }

    /// Add an optional string argument.
    #[must_use]
    pub fn optional_arg(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.argument(PromptArgument::optional(name, description))
    }
}

/// An argument that a prompt accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Name of the argument.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether this argument is required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl PromptArgument {
    /// Create a required argument.
    #[must_use]
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            required: Some(true),
        }
    }

    /// Create an optional argument.
    #[must_use]
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            required: Some(false),
        }
    }
}

/// A message in a prompt result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// The role of the message sender.
    pub role: Role,
    /// The message content.
    pub content: Content,
}

impl PromptMessage {
    /// Create a user message with text content.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::text(text),
        }
    }

    /// Create an assistant message with text content.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::text(text),
        }
    }
}

/// The result of getting a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPromptResult {
    /// Optional description of the rendered prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The prompt messages.
    pub messages: Vec<PromptMessage>,
}

impl GetPromptResult {
    /// Create a prompt result from messages.
    #[must_use]
    pub fn messages(messages: Vec<PromptMessage>) -> Self {
        Self {
            description: None,
            messages,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Response for listing prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPromptsResult {
    /// The list of available prompts.
    pub prompts: Vec<Prompt>,
    /// Cursor for the next page.
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Request parameters for getting a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPromptRequest {
    /// Name of the prompt to get.
    pub name: String,
    /// Arguments to pass to the prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Map<String, serde_json::Value>>,
}

impl GetPromptRequest {
    /// Create a request without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }

    /// Add a string argument.
    #[must_use]
    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), serde_json::Value::String(value.into()));
        self
    }

    /// Get a string argument by key.
    #[must_use]
    pub fn argument(&self, key: &str) -> Option<&str> {
        self.arguments.as_ref()?.get(key)?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_builder() {
        let prompt = Prompt::new("greet")
            .description("A greeting prompt")
            .required_arg("name", "Name of the person to greet")
            .optional_arg("tone", "Tone of the greeting");

        let arguments = prompt.arguments.unwrap();
        assert_eq!(arguments.len(), 2);
        assert_eq!(arguments[0].required, Some(true));
        assert_eq!(arguments[1].required, Some(false));
    }

    #[test]
    fn test_prompt_result() {
        let result = GetPromptResult::messages(vec![PromptMessage::assistant("Hello!")])
            .description("greeting");

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["messages"][0]["role"], "assistant");
        assert_eq!(json["messages"][0]["content"]["type"], "text");
        assert_eq!(json["description"], "greeting");
    }

    #[test]
    fn test_request_arguments() {
        let request = GetPromptRequest::new("greet").with_argument("name", "Ada");
        assert_eq!(request.argument("name"), Some("Ada"));
        assert_eq!(request.argument("other"), None);
        assert_eq!(GetPromptRequest::new("greet").argument("name"), None);
    }
}
