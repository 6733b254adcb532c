//! Job broker trait and in-memory implementation
//!
//! The broker is the durability boundary of the worker pattern: a producer
//! enqueues work, a single worker blocks on [`JobBroker::dequeue_blocking`],
//! and answers come back through write-once result cells with an expiry,
//! which polling clients read without consuming.
//!
//! Delivery is at-least-once. A dequeued job stays tracked as in-flight
//! until the worker acks it; if the worker dies mid-processing,
//! [`JobBroker::redeliver_unacked`] returns the job to the queue instead of
//! losing it. Exactly one consumer removes each job per delivery.
//!
//! [`InMemoryJobBroker`] mirrors the shape of a key/list broker (list push
//! and blocking pop, result keys with a TTL) for development and tests;
//! production deployments implement [`JobBroker`] against a real broker and
//! lean on its own requeue guarantees.

use crate::error::{QueueError, Result};
use crate::job::{Job, JobResult};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::debug;

/// Queue operations shared by producers, the worker, and polling clients
#[async_trait]
pub trait JobBroker: Send + Sync {
    /// Publish a job
    async fn enqueue(&self, job: Job) -> Result<()>;

    /// Remove and return exactly one job, waiting while the queue is empty
    ///
    /// The wait parks on a notifier and wakes immediately on availability;
    /// there is no polling. The returned job is tracked as in-flight until
    /// [`ack`](Self::ack).
    async fn dequeue_blocking(&self) -> Result<Job>;

    /// Mark an in-flight job as done, removing it from redelivery
    async fn ack(&self, job_id: &str) -> Result<()>;

    /// Return every unacked in-flight job to the queue
    ///
    /// Called on worker crash recovery; returns how many jobs went back.
    async fn redeliver_unacked(&self) -> Result<usize>;

    /// Publish an answer for a job, write-once with an expiry
    async fn publish_result(&self, job_id: &str, answer: &str, ttl: Duration) -> Result<()>;

    /// Publish a prepared [`JobResult`]
    async fn publish(&self, result: &JobResult) -> Result<()> {
        self.publish_result(&result.job_id, &result.answer, result.ttl)
            .await
    }

    /// Read a job's answer without consuming it; expired answers read as
    /// absent
    async fn poll_result(&self, job_id: &str) -> Result<Option<String>>;
}

#[derive(Debug)]
struct StoredResult {
    answer: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    pending: VecDeque<Job>,
    in_flight: HashMap<String, Job>,
    results: HashMap<String, StoredResult>,
    closed: bool,
}

/// In-memory broker for development and tests
#[derive(Debug, Default)]
pub struct InMemoryJobBroker {
    inner: Mutex<Inner>,
    available: Notify,
}

impl InMemoryJobBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop accepting jobs and wake blocked consumers
    ///
    /// Pending jobs already enqueued are still delivered; once drained,
    /// `dequeue_blocking` returns [`QueueError::Closed`].
    pub async fn close(&self) {
        self.inner.lock().await.closed = true;
        self.available.notify_waiters();
    }

    /// Jobs waiting to be dequeued
    pub async fn pending_count(&self) -> usize {
        self.inner.lock().await.pending.len()
    }

    /// Jobs dequeued but not yet acked
    pub async fn in_flight_count(&self) -> usize {
        self.inner.lock().await.in_flight.len()
    }
}

#[async_trait]
impl JobBroker for InMemoryJobBroker {
    async fn enqueue(&self, job: Job) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(QueueError::Closed);
        }
        debug!(job_id = %job.job_id, "job enqueued");
        inner.pending.push_back(job);
        drop(inner);
        self.available.notify_one();
        Ok(())
    }

    async fn dequeue_blocking(&self) -> Result<Job> {
        loop {
            // Arm the notifier before checking, so an enqueue between the
            // check and the await cannot be missed.
            let notified = self.available.notified();
            {
                let mut inner = self.inner.lock().await;
                if let Some(job) = inner.pending.pop_front() {
                    inner.in_flight.insert(job.job_id.clone(), job.clone());
                    debug!(job_id = %job.job_id, "job dequeued");
                    return Ok(job);
                }
                if inner.closed {
                    return Err(QueueError::Closed);
                }
            }
            notified.await;
        }
    }

    async fn ack(&self, job_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .in_flight
            .remove(job_id)
            .map(|_| ())
            .ok_or_else(|| QueueError::UnknownJob(job_id.to_string()))
    }

    async fn redeliver_unacked(&self) -> Result<usize> {
        let mut inner = self.inner.lock().await;
        let jobs: Vec<Job> = inner.in_flight.drain().map(|(_, job)| job).collect();
        let count = jobs.len();
        for job in jobs {
            debug!(job_id = %job.job_id, "job redelivered");
            inner.pending.push_back(job);
        }
        drop(inner);
        for _ in 0..count {
            self.available.notify_one();
        }
        Ok(count)
    }

    async fn publish_result(&self, job_id: &str, answer: &str, ttl: Duration) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();

        if let Some(existing) = inner.results.get(job_id) {
            if existing.expires_at > now {
                return Err(QueueError::ResultAlreadyPublished(job_id.to_string()));
            }
        }

        inner.results.insert(
            job_id.to_string(),
            StoredResult {
                answer: answer.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn poll_result(&self, job_id: &str) -> Result<Option<String>> {
        let mut inner = self.inner.lock().await;
        match inner.results.get(job_id) {
            Some(result) if result.expires_at > Instant::now() => Ok(Some(result.answer.clone())),
            Some(_) => {
                inner.results.remove(job_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
