//! Books MCP server.
//!
//! ```text
//! books-server --config configs/config.toml --sse
//! books-server --config configs/config.toml --stdio
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use books_server::admin::{self, AdminState};
use books_server::{AppConfig, Error, Shutdown, build_module, wait_for_shutdown};

const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "books-server", version, about = "Books library MCP server")]
struct Cli {
    /// Path to the TOML configuration.
    #[arg(long, env = "BOOKS_CONFIG", default_value = "configs/config.toml")]
    config: PathBuf,

    /// Expose the SSE transport regardless of the configuration.
    #[arg(long)]
    sse: bool,

    /// Expose the stdio transport regardless of the configuration.
    #[arg(long)]
    stdio: bool,

    /// Export request spans to this OTLP/gRPC endpoint.
    #[cfg(feature = "otel")]
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otel_endpoint: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("books-server: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let mut config = AppConfig::from_file(&cli.config)?;
    if cli.sse {
        config.mcp.transport.sse.expose = true;
    }
    if cli.stdio {
        config.mcp.transport.stdio.expose = true;
    }

    #[cfg(feature = "otel")]
    let _guard = match &cli.otel_endpoint {
        Some(endpoint) => Some(
            mcpmod::server::init_tracing_with_otel(&config.mcp.name, endpoint)
                .map_err(|e| Error::Logging(e.to_string()))?,
        ),
        None => {
            init_logging()?;
            None
        }
    };
    #[cfg(not(feature = "otel"))]
    init_logging()?;

    let metrics = prometheus::Registry::new();
    let module = Arc::new(build_module(&config, &metrics)?);
    let transports = module.start();

    let listener = TcpListener::bind(&config.app.admin_address)
        .await
        .map_err(Error::Admin)?;
    tracing::info!(address = %config.app.admin_address, "admin server listening");
    let app = admin::router(Arc::new(AdminState {
        metrics,
        module: Arc::clone(&module),
    }));
    let (stop_admin, admin_stopped) = oneshot::channel::<()>();
    let admin = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = admin_stopped.await;
            })
            .await
        {
            tracing::error!(error = %e, "admin server failed");
        }
    });

    match wait_for_shutdown(transports, shutdown_signal()).await {
        Shutdown::Signal => tracing::info!("shutdown signal received"),
        Shutdown::TransportsExited => tracing::info!("all MCP transports exited"),
    }

    let _ = stop_admin.send(());
    if let Err(e) = admin.await {
        tracing::error!(error = %e, "admin server task failed");
    }
    module.stop(SHUTDOWN_DEADLINE).await?;
    tracing::info!("books server stopped");
    Ok(())
}

/// JSON logs on stderr; stdout is reserved for the stdio transport.
fn init_logging() -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
