//! Error types for the placelog store.
//!
//! This module defines the error hierarchy for all store operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Core error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A repository call was made before `Store::initialize` completed.
    #[error("Store is not initialized")]
    Uninitialized,

    /// Lookup or update by id for a row that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated (e.g. tag name collision).
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Input failed a domain rule (e.g. dish rating out of range).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage backend error (SQLite, filesystem, corrupt payload).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}
