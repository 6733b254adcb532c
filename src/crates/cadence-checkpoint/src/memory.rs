//! In-memory checkpoint storage for development and testing
//!
//! [`InMemoryCheckpointStore`] is the reference implementation of
//! [`CheckpointStore`]: a thread-safe map from thread id to an append-only
//! vector of checkpoints. It honors the full store contract, including the
//! check-and-set write, so engine behavior observed against it carries over
//! to durable backends.
//!
//! Data lives only as long as the process; production deployments should
//! implement [`CheckpointStore`] against a database. The `clear` and count
//! helpers exist for test isolation.

use crate::{
    checkpoint::{Checkpoint, ThreadId},
    error::{Result, StoreError},
    store::{CheckpointStore, CheckpointStream},
};
use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory checkpoint storage
type Storage = Arc<RwLock<HashMap<ThreadId, Vec<Checkpoint>>>>;

/// In-memory checkpoint store
///
/// Cloning is shallow; clones share the same underlying storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointStore {
    storage: Storage,
}

impl InMemoryCheckpointStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads with at least one checkpoint
    pub async fn thread_count(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Total number of checkpoints across all threads
    pub async fn checkpoint_count(&self) -> usize {
        self.storage.read().await.values().map(Vec::len).sum()
    }

    /// Drop all checkpoints (test helper)
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn put(
        &self,
        thread_id: &str,
        checkpoint: Checkpoint,
        expected_seq: Option<u64>,
    ) -> Result<()> {
        let mut storage = self.storage.write().await;
        let line = storage.entry(thread_id.to_string()).or_default();

        let actual = line.last().map(|cp| cp.seq);
        if actual != expected_seq {
            return Err(StoreError::ConcurrentModification {
                thread_id: thread_id.to_string(),
                expected: expected_seq,
                actual,
            });
        }

        let next_seq = expected_seq.map_or(0, |s| s + 1);
        if checkpoint.seq != next_seq {
            return Err(StoreError::Invalid(format!(
                "checkpoint seq {} does not follow {:?}",
                checkpoint.seq, expected_seq
            )));
        }

        line.push(checkpoint);
        Ok(())
    }

    async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let storage = self.storage.read().await;
        Ok(storage.get(thread_id).and_then(|line| line.last().cloned()))
    }

    async fn get(&self, thread_id: &str, seq: u64) -> Result<Option<Checkpoint>> {
        let storage = self.storage.read().await;
        Ok(storage
            .get(thread_id)
            .and_then(|line| line.iter().find(|cp| cp.seq == seq).cloned()))
    }

    async fn list(&self, thread_id: &str) -> Result<CheckpointStream> {
        let storage = self.storage.read().await;
        let snapshots: Vec<Result<Checkpoint>> = storage
            .get(thread_id)
            .map(|line| line.iter().rev().cloned().map(Ok).collect())
            .unwrap_or_default();
        Ok(Box::pin(stream::iter(snapshots)))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.storage.write().await.remove(thread_id);
        Ok(())
    }
}
