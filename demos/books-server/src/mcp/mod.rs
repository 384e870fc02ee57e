//! The books capabilities.

use std::sync::Arc;

use mcpmod_server::CapabilityRegistry;

use crate::config::BooksConfig;
use crate::domain::BookService;

pub mod prompt;
pub mod resource;
pub mod tool;

pub use prompt::GreetPrompt;
pub use resource::{SearchBookResource, WeatherResource};
pub use tool::{CreateBookTool, DeleteBookTool, ListBooksTool};

/// Every books capability, ready for the module.
#[must_use]
pub fn registry(
    config: &BooksConfig,
    service: &Arc<BookService>,
    http: reqwest::Client,
) -> CapabilityRegistry {
    CapabilityRegistry::builder()
        .tool(Arc::new(ListBooksTool::new(Arc::clone(service))))
        .tool(Arc::new(CreateBookTool::new(Arc::clone(service))))
        .tool(Arc::new(DeleteBookTool::new(Arc::clone(service))))
        .prompt(Arc::new(GreetPrompt::new(config.owner.clone())))
        .resource(Arc::new(WeatherResource::new(
            config.weather_host.clone(),
            http,
        )))
        .resource_template(Arc::new(SearchBookResource))
        .build()
}
