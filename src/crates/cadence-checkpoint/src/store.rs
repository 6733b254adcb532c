//! Extensible checkpoint storage trait for custom backend implementations
//!
//! This module defines the [`CheckpointStore`] trait, the persistence boundary
//! of the workflow engine. Any store that offers an append-style write and a
//! latest-read keyed by thread id can back the engine: a document database, a
//! SQL table, or the bundled in-memory store.
//!
//! # Contract
//!
//! - **Append-only**: `put` adds a new snapshot to the thread's checkpoint
//!   line; existing snapshots are never rewritten. The snapshot with the
//!   highest sequence number is the thread's current state.
//! - **Durable before return**: when `put` returns `Ok`, the caller treats
//!   the checkpoint as committed. A store that cannot guarantee durability at
//!   that point must return [`StoreError::Unavailable`] instead, so the
//!   engine fails closed and the step is not considered complete.
//! - **Check-and-set**: `put` takes the sequence number the caller believes
//!   is current. If the store's latest sequence differs, the write must fail
//!   with [`StoreError::ConcurrentModification`] and persist nothing. This is
//!   what serializes writers per thread: of two racing calls, exactly one
//!   commits.
//! - **Thread isolation**: different thread ids share nothing and may be
//!   written in parallel without coordination.
//!
//! # Implementing a backend
//!
//! ```rust,ignore
//! use cadence_checkpoint::{Checkpoint, CheckpointStore, CheckpointStream, StoreError};
//! use async_trait::async_trait;
//!
//! struct DocumentStore { collection: Collection }
//!
//! #[async_trait]
//! impl CheckpointStore for DocumentStore {
//!     async fn put(
//!         &self,
//!         thread_id: &str,
//!         checkpoint: Checkpoint,
//!         expected_seq: Option<u64>,
//!     ) -> cadence_checkpoint::Result<()> {
//!         // Insert with a unique index on (thread_id, seq); a duplicate-key
//!         // failure maps to ConcurrentModification.
//!         ...
//!     }
//!
//!     async fn get_latest(&self, thread_id: &str) -> cadence_checkpoint::Result<Option<Checkpoint>> {
//!         // SELECT ... WHERE thread_id = ? ORDER BY seq DESC LIMIT 1
//!         ...
//!     }
//!
//!     async fn get(&self, thread_id: &str, seq: u64) -> cadence_checkpoint::Result<Option<Checkpoint>> { ... }
//!     async fn list(&self, thread_id: &str) -> cadence_checkpoint::Result<CheckpointStream> { ... }
//!     async fn delete_thread(&self, thread_id: &str) -> cadence_checkpoint::Result<()> { ... }
//! }
//! ```

use crate::{
    checkpoint::Checkpoint,
    error::Result,
};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

/// Async stream of checkpoints, newest first
pub type CheckpointStream = Pin<Box<dyn Stream<Item = Result<Checkpoint>> + Send + 'static>>;

/// Storage backend for workflow checkpoints
///
/// Implementations must be `Send + Sync`; the engine shares one store across
/// all threads it executes.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Append a checkpoint to a thread's line.
    ///
    /// `expected_seq` is the sequence number of the latest checkpoint the
    /// caller observed, or `None` when the caller believes the thread has no
    /// checkpoints yet. A mismatch against the store's actual latest sequence
    /// fails with [`StoreError::ConcurrentModification`] without persisting
    /// anything.
    ///
    /// The checkpoint's own `seq` must be exactly one past `expected_seq`
    /// (or 0 when `expected_seq` is `None`); stores reject anything else as
    /// [`StoreError::Invalid`].
    ///
    /// [`StoreError::ConcurrentModification`]: crate::StoreError::ConcurrentModification
    /// [`StoreError::Invalid`]: crate::StoreError::Invalid
    async fn put(
        &self,
        thread_id: &str,
        checkpoint: Checkpoint,
        expected_seq: Option<u64>,
    ) -> Result<()>;

    /// Fetch the current (highest-sequence) checkpoint for a thread
    async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// Fetch a specific checkpoint by sequence number
    async fn get(&self, thread_id: &str, seq: u64) -> Result<Option<Checkpoint>>;

    /// Stream a thread's checkpoint history, newest first
    async fn list(&self, thread_id: &str) -> Result<CheckpointStream>;

    /// True when no checkpoint exists for the thread
    ///
    /// Lets callers distinguish a fresh run from a resumable one before
    /// deciding what input to supply.
    async fn is_new(&self, thread_id: &str) -> Result<bool> {
        Ok(self.get_latest(thread_id).await?.is_none())
    }

    /// Remove every checkpoint for a thread
    ///
    /// This is the only way checkpoints are deleted.
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;
}
