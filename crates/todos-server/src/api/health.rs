//! Health check endpoint

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;
use std::time::Instant;
use tokio::time::timeout;

use todos_core::Error;

use crate::TodosServer;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall health status
    pub status: HealthStatus,
    /// Timestamp of the health check
    pub timestamp: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Version information
    pub version: String,
    /// Todo store status
    pub store: StoreStatus,
}

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// All systems healthy
    Healthy,
    /// Store probe failed or timed out
    Degraded,
}

/// Todo store component status
///
/// The store connects lazily, so `connected: false` with no error is the
/// normal state of a fresh server and counts as healthy.
#[derive(Debug, Serialize)]
pub struct StoreStatus {
    /// Whether the backing store is live
    pub connected: bool,
    /// Number of persisted todos, when the store is live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todos: Option<u64>,
    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Application start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the health check system
pub fn init() {
    let _ = START_TIME.set(Instant::now());
}

/// Get health status
pub async fn health_check(State(server): State<TodosServer>) -> Json<HealthResponse> {
    let start_time = START_TIME.get().copied().unwrap_or_else(Instant::now);
    let uptime = start_time.elapsed();

    let timestamp = chrono::Utc::now().to_rfc3339();
    let version = env!("CARGO_PKG_VERSION").to_string();

    let store = check_store(&server).await;
    let status = if store.error.is_none() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    tracing::debug!(
        "Health check - Status: {:?}, Uptime: {}s, Store: {:?}",
        status,
        uptime.as_secs(),
        store
    );

    Json(HealthResponse {
        status,
        timestamp,
        uptime_seconds: uptime.as_secs(),
        version,
        store,
    })
}

/// Probe the todo store without forcing a connection
///
/// A count on an unconnected store comes back as [`Error::NotConnected`],
/// which is the lazy-connection resting state, not a failure.
async fn check_store(server: &TodosServer) -> StoreStatus {
    match timeout(server.insert_timeout, server.store.count()).await {
        Ok(Ok(count)) => StoreStatus {
            connected: true,
            todos: Some(count),
            error: None,
        },
        Ok(Err(Error::NotConnected)) => StoreStatus {
            connected: false,
            todos: None,
            error: None,
        },
        Ok(Err(e)) => StoreStatus {
            connected: true,
            todos: None,
            error: Some(e.to_string()),
        },
        Err(_) => StoreStatus {
            connected: true,
            todos: None,
            error: Some("store probe timed out".to_string()),
        },
    }
}
