//! # cadence-checkpoint - State Persistence for Workflow Execution
//!
//! Trait-based checkpoint abstractions and a reference in-memory store for
//! persisting and restoring workflow thread state. Checkpoints are what let a
//! workflow survive process restarts, pause for a human, and resume exactly
//! where it halted.
//!
//! ## Core concepts
//!
//! - [`Checkpoint`] - one durable snapshot: state, next step, suspension
//!   marker, and a per-thread sequence number that increases strictly by 1.
//! - [`CheckpointStore`] - the persistence boundary. Backends append
//!   snapshots, serve the latest one, and enforce a check-and-set write so
//!   only one caller can advance a thread at a time.
//! - [`InMemoryCheckpointStore`] - reference implementation for development
//!   and tests.
//! - [`SerializerProtocol`] - pluggable wire format for byte-oriented
//!   backends.
//!
//! ## Quick start
//!
//! ```rust
//! use cadence_checkpoint::{
//!     Checkpoint, CheckpointSource, CheckpointStore, InMemoryCheckpointStore,
//! };
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryCheckpointStore::new();
//!
//!     let snapshot = Checkpoint::new(
//!         0,
//!         json!({"messages": []}),
//!         Some("chatbot".to_string()),
//!         CheckpointSource::Input,
//!     );
//!     store.put("customer-123", snapshot, None).await?;
//!
//!     let latest = store.get_latest("customer-123").await?;
//!     assert_eq!(latest.map(|cp| cp.seq), Some(0));
//!     Ok(())
//! }
//! ```

pub mod checkpoint;
pub mod error;
pub mod memory;
pub mod serializer;
pub mod store;

pub use checkpoint::{Checkpoint, CheckpointId, CheckpointSource, ThreadId};
pub use error::{Result, StoreError};
pub use memory::InMemoryCheckpointStore;
pub use serializer::{BincodeSerializer, JsonSerializer, SerializerProtocol};
pub use store::{CheckpointStore, CheckpointStream};
