//! Todos Server binary
//!
//! Parses CLI arguments, initializes tracing, loads configuration, builds
//! the lazily-connected todo store and serves the HTTP API.

use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todos_core::{StoreOptions, TodoStore};
use todos_server::{TodosServer, api, config::Config, router};

/// Todos Server CLI arguments
#[derive(Parser, Debug)]
#[command(name = "todos-server")]
#[command(about = "Todos HTTP server over an embedded document store", long_about = None)]
struct Args {
    /// Enable verbose logging (prints debug information to stdout/stderr)
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Directory searched for the optional todos.toml config file
    #[arg(long, default_value = "config")]
    config_dir: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    let filter = if args.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "todos_server=debug,tower_http=debug".into())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "todos_server=info,tower_http=info".into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (from env vars and/or <config_dir>/todos.toml)
    let config = Config::load(&args.config_dir);

    // The store connects lazily; nothing under data_dir is created until
    // the first request needs it.
    let store = TodoStore::with_options(
        &config.data_dir,
        StoreOptions {
            map_size: config.todos.map_size,
            policy: config.todos.category_policy,
            categories: config.todos.categories.clone(),
        },
    );
    info!("Using data directory: {}", config.data_dir);
    info!(
        "Category policy: {} ({})",
        config.todos.category_policy,
        config.todos.categories.join(", ")
    );

    let server = TodosServer::new(Arc::new(store), &config);

    // Initialize health check system
    api::health::init();

    let app = router(server);

    let listener = TcpListener::bind(&config.addr).await?;
    info!("Todos Server listening on {}", config.addr);

    axum::serve(listener, app).await?;

    Ok(())
}
