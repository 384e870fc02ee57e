//! Resources: current weather and a book search template.

use mcpmod_core::McpError;
use mcpmod_core::types::{ReadResourceRequest, Resource, ResourceContents, ResourceTemplate};
use mcpmod_server::{
    ResourceHandler, ResourceProvider, ResourceTemplateHandler, ResourceTemplateProvider,
};

/// `weather`: the weather in Paris, as reported by a `wttr.in` compatible
/// service.
#[derive(Debug, Clone)]
pub struct WeatherResource {
    host: String,
    client: reqwest::Client,
}

impl WeatherResource {
    /// Query `host` with `client`.
    #[must_use]
    pub fn new(host: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            host: host.into(),
            client,
        }
    }
}

impl ResourceProvider for WeatherResource {
    fn name(&self) -> &str {
        "weather"
    }

    fn options(&self) -> Resource {
        Resource::new("weather://paris", "weather")
            .description("Search weather information for a city on https://wttr.in/")
            .mime_type("text/plain")
    }

    fn handler(&self) -> ResourceHandler {
        let this = self.clone();
        ResourceHandler::new(move |_ctx, req: ReadResourceRequest| {
            let this = this.clone();
            async move {
                let url = format!("{}/paris?format=3", this.host);
                let response = this
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| {
                        McpError::internal_with_source(format!("weather request failed: {e}"), e)
                    })?;

                let status = response.status();
                if status != reqwest::StatusCode::OK {
                    return Err(McpError::internal(format!(
                        "unexpected status code {}",
                        status.as_u16()
                    )));
                }

                let body = response
                    .text()
                    .await
                    .map_err(|e| McpError::internal_with_source("cannot read body", e))?;
                Ok(vec![ResourceContents::text(req.uri, "text/plain", body)])
            }
        })
        .named(std::any::type_name::<Self>())
    }
}

/// `search-book`: book information for a title.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchBookResource;

impl ResourceTemplateProvider for SearchBookResource {
    fn name(&self) -> &str {
        "search-book"
    }

    fn options(&self) -> ResourceTemplate {
        ResourceTemplate::new("books://{title}", "search-book")
            .description("Books information search on the openlibrary.org API.")
            .mime_type("application/json")
    }

    fn handler(&self) -> ResourceTemplateHandler {
        ResourceTemplateHandler::new(|_ctx, req: ReadResourceRequest| async move {
            Ok(vec![ResourceContents::text(
                req.uri,
                "application/json",
                "some fake search",
            )])
        })
        .named(std::any::type_name::<Self>())
    }
}
