//! Book management tools.

use std::sync::Arc;

use mcpmod_core::McpError;
use mcpmod_core::types::{CallToolRequest, CallToolResult, Tool, ToolAnnotations};
use mcpmod_server::{ToolHandler, ToolProvider};

use crate::domain::{BookService, GENRES};

fn genre_filter(req: &CallToolRequest) -> Option<String> {
    req.string_argument("genre")
        .filter(|genre| !genre.is_empty())
        .map(str::to_string)
}

fn required(req: &CallToolRequest, key: &str) -> Result<String, McpError> {
    req.string_argument(key)
        .map(str::to_string)
        .ok_or_else(|| McpError::internal(format!("{key} must be a string")))
}

/// `list-books`: every book, optionally of one genre, as JSON.
#[derive(Debug, Clone)]
pub struct ListBooksTool {
    service: Arc<BookService>,
}

impl ListBooksTool {
    /// Read from `service`.
    #[must_use]
    pub const fn new(service: Arc<BookService>) -> Self {
        Self { service }
    }
}

impl ToolProvider for ListBooksTool {
    fn name(&self) -> &str {
        "list-books"
    }

    fn options(&self) -> Tool {
        let mut genres = vec![""];
        genres.extend(GENRES);
        Tool::new("list-books")
            .description("To list one or several existing books.")
            .with_enum_param(
                "genre",
                "Optional genre of the books to list. Empty value means all genres.",
                &genres,
                false,
            )
            .annotations(ToolAnnotations::read_only())
    }

    fn handler(&self) -> ToolHandler {
        let service = Arc::clone(&self.service);
        ToolHandler::new(move |ctx, req: CallToolRequest| {
            let service = Arc::clone(&service);
            async move {
                tracing::info!(parent: ctx.span(), "some logs from the list tool");

                let books = service.list_books(genre_filter(&req)).await;
                CallToolResult::json(&books)
                    .map_err(|e| McpError::internal_with_source("failed to encode books", e))
            }
        })
        .named(std::any::type_name::<Self>())
    }
}

/// `create-book`: store a book and return it as JSON.
#[derive(Debug, Clone)]
pub struct CreateBookTool {
    service: Arc<BookService>,
}

impl CreateBookTool {
    /// Write to `service`.
    #[must_use]
    pub const fn new(service: Arc<BookService>) -> Self {
        Self { service }
    }
}

impl ToolProvider for CreateBookTool {
    fn name(&self) -> &str {
        "create-book"
    }

    fn options(&self) -> Tool {
        Tool::new("create-book")
            .description("To create a new book.")
            .with_string_param("title", "Title of the book.", true)
            .with_enum_param("genre", "Genre of the book.", &GENRES, true)
            .with_string_param("synopsis", "Synopsis of the book.", true)
    }

    fn handler(&self) -> ToolHandler {
        let service = Arc::clone(&self.service);
        ToolHandler::new(move |_ctx, req: CallToolRequest| {
            let service = Arc::clone(&service);
            async move {
                let title = required(&req, "title")?;
                let genre = required(&req, "genre")?;
                let synopsis = required(&req, "synopsis")?;

                let book = service
                    .create_book(title, genre, synopsis)
                    .await
                    .map_err(|e| {
                        McpError::internal_with_source(format!("failed to create book: {e}"), e)
                    })?;
                CallToolResult::json(&book)
                    .map_err(|e| McpError::internal_with_source("failed to encode book", e))
            }
        })
        .named(std::any::type_name::<Self>())
    }
}

/// `delete-book`: remove books by id and/or genre.
#[derive(Debug, Clone)]
pub struct DeleteBookTool {
    service: Arc<BookService>,
}

impl DeleteBookTool {
    /// Write to `service`.
    #[must_use]
    pub const fn new(service: Arc<BookService>) -> Self {
        Self { service }
    }
}

impl ToolProvider for DeleteBookTool {
    fn name(&self) -> &str {
        "delete-book"
    }

    fn options(&self) -> Tool {
        let mut genres = vec![""];
        genres.extend(GENRES);
        Tool::new("delete-book")
            .description("To delete one or several existing books.")
            .with_string_param(
                "id",
                "Optional ID of the book to delete. Empty value means no book selection by id.",
                false,
            )
            .with_enum_param(
                "genre",
                "Optional genre of the book. Empty value means no books selection by genre.",
                &genres,
                false,
            )
            .annotations(ToolAnnotations::destructive())
    }

    fn handler(&self) -> ToolHandler {
        let service = Arc::clone(&self.service);
        ToolHandler::new(move |_ctx, req: CallToolRequest| {
            let service = Arc::clone(&service);
            async move {
                let id = match req.string_argument("id").filter(|id| !id.is_empty()) {
                    Some(id) => Some(id.parse::<i32>().map_err(|e| {
                        McpError::internal_with_source(format!("invalid book id {id:?}"), e)
                    })?),
                    None => None,
                };

                let deleted = service.delete_books(id, genre_filter(&req)).await;
                Ok(CallToolResult::text(format!("{deleted} books were deleted")))
            }
        })
        .named(std::any::type_name::<Self>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpmod_server::{RequestContext, TransportKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ctx() -> RequestContext {
        RequestContext::new("r", "s", TransportKind::Stdio)
    }

    async fn call(
        provider: &dyn ToolProvider,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, McpError> {
        provider
            .handler()
            .call(ctx(), CallToolRequest::new(provider.name(), arguments))
            .await
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let service = Arc::new(BookService::default());
        let create = CreateBookTool::new(Arc::clone(&service));
        let list = ListBooksTool::new(Arc::clone(&service));

        let created = call(
            &create,
            json!({"title": "Dune", "genre": "science-fiction", "synopsis": "Spice."}),
        )
        .await
        .unwrap();
        let book: serde_json::Value =
            serde_json::from_str(created.content[0].as_text().unwrap()).unwrap();
        assert_eq!(book["id"], 1);
        assert_eq!(book["title"], "Dune");

        let listed = call(&list, json!({"genre": ""})).await.unwrap();
        let books: Vec<serde_json::Value> =
            serde_json::from_str(listed.content[0].as_text().unwrap()).unwrap();
        assert_eq!(books.len(), 1);
    }

    #[tokio::test]
    async fn test_create_requires_every_field() {
        let create = CreateBookTool::new(Arc::new(BookService::default()));
        let err = call(&create, json!({"title": "Dune"})).await.unwrap_err();
        assert!(err.to_string().contains("genre must be a string"));
    }

    #[tokio::test]
    async fn test_delete_reports_count() {
        let service = Arc::new(BookService::default());
        service
            .create_book("It".to_string(), "horror".to_string(), String::new())
            .await
            .unwrap();
        let delete = DeleteBookTool::new(service);

        let result = call(&delete, json!({"id": "1"})).await.unwrap();
        assert_eq!(result.content[0].as_text(), Some("1 books were deleted"));

        let result = call(&delete, json!({})).await.unwrap();
        assert_eq!(result.content[0].as_text(), Some("0 books were deleted"));
    }

    #[tokio::test]
    async fn test_delete_rejects_bad_id() {
        let delete = DeleteBookTool::new(Arc::new(BookService::default()));
        let err = call(&delete, json!({"id": "abc"})).await.unwrap_err();
        assert!(err.to_string().contains("invalid book id"));
    }

    #[test]
    fn test_list_schema_allows_empty_genre() {
        let tool = ListBooksTool::new(Arc::new(BookService::default())).options();
        assert_eq!(tool.input_schema["properties"]["genre"]["enum"][0], "");
    }
}
