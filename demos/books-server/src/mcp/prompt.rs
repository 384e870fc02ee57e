use mcpmod_core::types::{GetPromptRequest, GetPromptResult, Prompt, PromptArgument, PromptMessage};
use mcpmod_server::{PromptHandler, PromptProvider};

/// `greet`: an assistant greeting for the books owner.
#[derive(Debug, Clone)]
pub struct GreetPrompt {
    default_owner: String,
}

impl GreetPrompt {
    /// Greet `default_owner` when no name is given.
    #[must_use]
    pub fn new(default_owner: impl Into<String>) -> Self {
        Self {
            default_owner: default_owner.into(),
        }
    }
}

impl PromptProvider for GreetPrompt {
    fn name(&self) -> &str {
        "greet"
    }

    fn options(&self) -> Prompt {
        Prompt::new("greet")
            .description("A books assistant greeting prompt")
            .argument(PromptArgument::optional("name", "Name of books owner to greet"))
    }

    fn handler(&self) -> PromptHandler {
        let default_owner = self.default_owner.clone();
        PromptHandler::new(move |_ctx, req: GetPromptRequest| {
            let name = req
                .argument("name")
                .filter(|name| !name.is_empty())
                .unwrap_or(&default_owner)
                .to_string();
            async move {
                Ok(GetPromptResult::messages(vec![PromptMessage::assistant(format!(
                    "Hello, {name}! I am your books assistant. How can I help you today?"
                ))])
                .description("A books assistant greeting"))
            }
        })
        .named(std::any::type_name::<Self>())
    }
}
