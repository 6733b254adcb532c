//! Error types for checkpoint store operations

use thiserror::Error;

/// Result type for checkpoint store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing checkpoints
#[derive(Error, Debug)]
pub enum StoreError {
    /// No checkpoint exists for the requested thread or sequence
    #[error("Checkpoint not found: {0}")]
    NotFound(String),

    /// Optimistic concurrency check failed on write
    ///
    /// Another writer advanced the thread's checkpoint line since the caller
    /// loaded it. The caller should reload the latest checkpoint and retry or
    /// abort. Nothing was persisted.
    #[error("Concurrent modification on thread '{thread_id}': expected sequence {expected:?}, found {actual:?}")]
    ConcurrentModification {
        thread_id: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    /// The backing store could not be reached
    ///
    /// Fail-closed: callers must treat the write as not having happened.
    #[error("Checkpoint store unavailable: {0}")]
    Unavailable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binary serialization error
    #[error("Binary serialization error: {0}")]
    BinarySerialization(#[from] bincode::Error),

    /// Malformed checkpoint or invalid arguments
    #[error("Invalid checkpoint: {0}")]
    Invalid(String),
}
