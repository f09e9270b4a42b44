//! Todos Server - HTTP API for the todo document store
//!
//! Provides REST endpoints for:
//! - POST /api/todos/add - Validate a todo payload and persist it
//! - GET /api/todos - List all persisted todos
//! - GET /health - Service and store health
//!
//! The create pipeline is the heart of the service: ordered validation of
//! the request body, a lazy idempotent store connection, one insert per
//! accepted request, and distinct client/storage/timeout failure answers.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use todos_core::{CategoryPolicy, TodoGateway};

pub mod api;
pub mod config;

/// Todos server state
#[derive(Clone)]
pub struct TodosServer {
    /// Persistence gateway the handlers talk to
    pub store: Arc<dyn TodoGateway>,
    /// Where category membership is enforced
    pub category_policy: CategoryPolicy,
    /// Known category labels
    pub categories: Arc<Vec<String>>,
    /// Upper bound for one persistence round trip
    pub insert_timeout: Duration,
}

impl TodosServer {
    /// Create a new Todos server instance
    pub fn new(store: Arc<dyn TodoGateway>, config: &config::Config) -> Self {
        Self {
            store,
            category_policy: config.todos.category_policy,
            categories: Arc::new(config.todos.categories.clone()),
            insert_timeout: config.todos.insert_timeout(),
        }
    }
}

/// Build the HTTP router over a server state
///
/// Shared by `main` and the integration tests, so tests exercise exactly
/// the routes and middleware the binary serves.
pub fn router(server: TodosServer) -> Router {
    Router::new()
        .route("/", get(api::health::health_check))
        .route("/health", get(api::health::health_check))
        .route("/api/todos", get(api::todos::list_todos))
        .route("/api/todos/add", post(api::todos::add_todo))
        .with_state(server)
        // Compression for responses (gzip, br)
        .layer(CompressionLayer::new())
        // CORS support
        .layer(CorsLayer::permissive())
        // Request/response tracing
        .layer(TraceLayer::new_for_http())
}
