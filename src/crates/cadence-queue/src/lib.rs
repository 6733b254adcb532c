//! # cadence-queue - Durable Job Queue Worker Pattern
//!
//! The degenerate single-step cousin of the workflow engine: a producer
//! enqueues work, one worker blocks on the queue, processes each job, and
//! republishes the answer into a write-once result cell with a TTL. Polling
//! clients read results without consuming them.
//!
//! Durability guarantees, in order of importance:
//!
//! - a job is removed from the queue by exactly one consumer per delivery;
//! - a job is never silently dropped: until the worker acks, it stays
//!   in-flight and [`JobBroker::redeliver_unacked`] recovers it after a
//!   crash (at-least-once delivery);
//! - a published result is write-once while live and expires after its TTL.
//!
//! ## Quick start
//!
//! ```rust
//! use cadence_queue::{await_result, InMemoryJobBroker, Job, JobBroker, PollConfig, Worker};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker = Arc::new(InMemoryJobBroker::new());
//!
//!     // Producer side.
//!     let job = Job::new("What does the contract say about renewals?");
//!     let job_id = job.job_id.clone();
//!     broker.enqueue(job).await?;
//!
//!     // Worker side (normally a separate process).
//!     let worker = Worker::new(
//!         Arc::clone(&broker),
//!         Arc::new(|job: Job| Box::pin(async move { Ok(format!("answer for: {}", job.query)) })),
//!     )
//!     .with_result_ttl(Duration::from_secs(3600));
//!     worker.run_once().await?;
//!
//!     // Client side: bounded polling.
//!     let answer = await_result(broker.as_ref(), &job_id, PollConfig::default()).await?;
//!     assert!(answer.starts_with("answer for:"));
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod error;
pub mod job;
pub mod poll;
pub mod worker;

pub use broker::{InMemoryJobBroker, JobBroker};
pub use error::{BoxError, QueueError, Result};
pub use job::{Job, JobResult};
pub use poll::{await_result, PollConfig};
pub use worker::{JobHandler, Worker, DEFAULT_RESULT_TTL};
