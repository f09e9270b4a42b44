//! Error types for Todos Core

use thiserror::Error;

/// Result type alias using the Todos Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the todo document store
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors from store directory operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LMDB/heed database errors
    #[error("Database error: {0}")]
    Database(#[from] heed::Error),

    /// Gateway used before `connect()` established the backing store
    #[error("Store not connected")]
    NotConnected,

    /// Record rejected by store-side schema checks
    #[error("Schema violation: {0}")]
    Schema(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Create a schema violation error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
