//! End-to-end tests of the books capabilities over SSE.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use books_server::AppConfig;
use books_server::domain::{BookRepository, BookService};
use books_server::mcp;
use mcpmod_server::ModuleOptions;
use mcpmod_testing::fixtures::{call_tool, get_prompt, read_resource, request};
use mcpmod_testing::prelude::*;

const STOP_DEADLINE: Duration = Duration::from_secs(5);

fn config() -> AppConfig {
    let mut config = AppConfig::from_toml_str(include_str!("../configs/config.toml")).unwrap();
    config.mcp.transport.sse.base_url = String::new();
    config
}

async fn harness(config: &AppConfig) -> SseHarness {
    let service = Arc::new(BookService::new(BookRepository::new()));
    let registry = mcp::registry(&config.app, &service, reqwest::Client::new());
    SseHarness::start(
        config.mcp.clone(),
        registry,
        &prometheus::Registry::new(),
        ModuleOptions::default(),
    )
    .await
    .unwrap()
}

fn text(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

/// Serve a fixed weather report on a loopback port.
async fn weather_stub() -> String {
    let app = Router::new().route("/paris", get(|| async { "Paris: +21°C" }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}")
}

// =============================================================================
// Tools
// =============================================================================

#[tokio::test]
async fn test_create_list_and_delete_books() {
    let config = config();
    let harness = harness(&config).await;
    let mut client = harness.connect().await.unwrap();

    let created = client
        .request(&call_tool(
            1,
            "create-book",
            json!({"title": "Dune", "genre": "science-fiction", "synopsis": "Spice."}),
        ))
        .await
        .unwrap();
    let book: Value = serde_json::from_str(text(&created)).unwrap();
    assert_eq!(book["title"], "Dune");
    assert_eq!(book["genre"], "science-fiction");

    client
        .request(&call_tool(
            2,
            "create-book",
            json!({"title": "Carrie", "genre": "horror", "synopsis": "Prom."}),
        ))
        .await
        .unwrap();

    let listed = client
        .request(&call_tool(3, "list-books", json!({"genre": "horror"})))
        .await
        .unwrap();
    let books: Vec<Value> = serde_json::from_str(text(&listed)).unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Carrie");

    let deleted = client
        .request(&call_tool(4, "delete-book", json!({"genre": "science-fiction"})))
        .await
        .unwrap();
    assert_eq!(text(&deleted), "1 books were deleted");

    let listed = client
        .request(&call_tool(5, "list-books", json!({"genre": ""})))
        .await
        .unwrap();
    let books: Vec<Value> = serde_json::from_str(text(&listed)).unwrap();
    assert_eq!(books.len(), 1);

    harness.stop(STOP_DEADLINE).await.unwrap();
}

#[tokio::test]
async fn test_create_book_rejects_unknown_genre() {
    let config = config();
    let harness = harness(&config).await;
    let mut client = harness.connect().await.unwrap();

    let response = client
        .request(&call_tool(
            1,
            "create-book",
            json!({"title": "X", "genre": "poetry", "synopsis": "Y"}),
        ))
        .await
        .unwrap();
    assert_eq!(response["error"]["code"], -32603);
    assert!(
        response["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("failed to create book")
    );

    harness.stop(STOP_DEADLINE).await.unwrap();
}

#[tokio::test]
async fn test_list_tool_logs_inside_request_span() {
    let capture = Capture::new();
    let _guard = capture.install();
    let config = config();
    let harness = harness(&config).await;
    let mut client = harness.connect().await.unwrap();

    client
        .request(&call_tool(1, "list-books", json!({})))
        .await
        .unwrap();

    let event = &capture.events_with_message("some logs from the list tool")[0];
    let span = capture.event_span(event).unwrap();
    assert_eq!(span.display_name(), "MCP tools/call list-books");

    harness.stop(STOP_DEADLINE).await.unwrap();
}

// =============================================================================
// Prompts and resources
// =============================================================================

#[tokio::test]
async fn test_greet_prompt_defaults_to_owner() {
    let config = config();
    let harness = harness(&config).await;
    let mut client = harness.connect().await.unwrap();

    let response = client
        .request(&get_prompt(1, "greet", json!({})))
        .await
        .unwrap();
    assert_eq!(
        response["result"]["messages"][0]["content"]["text"],
        "Hello, John! I am your books assistant. How can I help you today?"
    );

    harness.stop(STOP_DEADLINE).await.unwrap();
}

#[tokio::test]
async fn test_weather_and_search_resources() {
    let mut config = config();
    config.app.weather_host = weather_stub().await;
    let harness = harness(&config).await;
    let mut client = harness.connect().await.unwrap();

    let weather = client
        .request(&read_resource(1, "weather://paris"))
        .await
        .unwrap();
    assert_eq!(weather["result"]["contents"][0]["text"], "Paris: +21°C");
    assert_eq!(weather["result"]["contents"][0]["mimeType"], "text/plain");

    let search = client
        .request(&read_resource(2, "books://dune"))
        .await
        .unwrap();
    assert_eq!(search["result"]["contents"][0]["uri"], "books://dune");
    assert_eq!(search["result"]["contents"][0]["text"], "some fake search");

    let templates = client
        .request(&request(3, "resources/templates/list", json!({})))
        .await
        .unwrap();
    assert_eq!(
        templates["result"]["resourceTemplates"][0]["uriTemplate"],
        "books://{title}"
    );

    harness.stop(STOP_DEADLINE).await.unwrap();
}

// =============================================================================
// Introspection
// =============================================================================

#[tokio::test]
async fn test_info_lists_books_capabilities() {
    let config = config();
    let harness = harness(&config).await;

    let info = harness.module().info();
    assert_eq!(
        info.server.tools.keys().collect::<Vec<_>>(),
        ["create-book", "delete-book", "list-books"]
    );
    assert_eq!(
        info.server.tools["list-books"],
        std::any::type_name::<mcp::ListBooksTool>()
    );
    assert_eq!(
        info.server.tools["create-book"],
        std::any::type_name::<mcp::CreateBookTool>()
    );
    assert_eq!(
        info.server.tools["delete-book"],
        std::any::type_name::<mcp::DeleteBookTool>()
    );
    assert_eq!(
        info.server.prompts["greet"],
        std::any::type_name::<mcp::GreetPrompt>()
    );
    assert_eq!(
        info.server.resources["weather"],
        std::any::type_name::<mcp::WeatherResource>()
    );
    assert_eq!(
        info.server.resource_templates["search-book"],
        std::any::type_name::<mcp::SearchBookResource>()
    );

    harness.stop(STOP_DEADLINE).await.unwrap();
}
