//! Worker loop
//!
//! A [`Worker`] owns a broker handle and an async handler. Each cycle it
//! blocks for a job, runs the handler, publishes the answer under the job's
//! id with the configured TTL, and acks. A handler failure leaves the job
//! unacked, so it stays recoverable through redelivery rather than being
//! silently dropped.

use crate::broker::JobBroker;
use crate::error::{BoxError, QueueError, Result};
use crate::job::Job;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default result expiry, one hour
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(3600);

/// Async job handler: query in, answer out
pub type JobHandler =
    Arc<dyn Fn(Job) -> Pin<Box<dyn Future<Output = std::result::Result<String, BoxError>> + Send>> + Send + Sync>;

/// Single-consumer worker over a [`JobBroker`]
pub struct Worker<B: JobBroker> {
    broker: Arc<B>,
    handler: JobHandler,
    result_ttl: Duration,
}

impl<B: JobBroker> Worker<B> {
    pub fn new(broker: Arc<B>, handler: JobHandler) -> Self {
        Self {
            broker,
            handler,
            result_ttl: DEFAULT_RESULT_TTL,
        }
    }

    /// Override how long published answers stay readable
    pub fn with_result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl = ttl;
        self
    }

    /// Process exactly one job: dequeue, handle, publish, ack
    ///
    /// Returns the processed job's id. On handler failure the job is left
    /// in-flight and unacked; it comes back on the next redelivery pass.
    pub async fn run_once(&self) -> Result<String> {
        let job = self.broker.dequeue_blocking().await?;
        let job_id = job.job_id.clone();
        info!(job_id = %job_id, "processing job");

        let answer = (self.handler)(job).await.map_err(|source| {
            warn!(job_id = %job_id, error = %source, "handler failed; job left for redelivery");
            QueueError::HandlerFailed {
                job_id: job_id.clone(),
                source,
            }
        })?;

        self.broker
            .publish_result(&job_id, &answer, self.result_ttl)
            .await?;
        self.broker.ack(&job_id).await?;
        info!(job_id = %job_id, "job completed");
        Ok(job_id)
    }

    /// Process jobs until the broker closes
    ///
    /// Handler failures are logged and skipped; the loop only stops on
    /// [`QueueError::Closed`] or a broker fault.
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.run_once().await {
                Ok(_) => {}
                Err(QueueError::Closed) => return Ok(()),
                Err(QueueError::HandlerFailed { .. }) => {}
                Err(other) => return Err(other),
            }
        }
    }
}

impl<B: JobBroker> std::fmt::Debug for Worker<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("result_ttl", &self.result_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InMemoryJobBroker;

    fn echo_handler() -> JobHandler {
        Arc::new(|job: Job| Box::pin(async move { Ok(format!("answer for: {}", job.query)) }))
    }

    #[tokio::test]
    async fn test_run_once_publishes_and_acks() {
        let broker = Arc::new(InMemoryJobBroker::new());
        broker.enqueue(Job::with_id("j1", "what is rust")).await.unwrap();

        let worker = Worker::new(Arc::clone(&broker), echo_handler());
        let job_id = worker.run_once().await.unwrap();
        assert_eq!(job_id, "j1");

        assert_eq!(
            broker.poll_result("j1").await.unwrap().as_deref(),
            Some("answer for: what is rust")
        );
        assert_eq!(broker.in_flight_count().await, 0);
    }

    #[tokio::test]
    async fn test_handler_failure_leaves_job_unacked() {
        let broker = Arc::new(InMemoryJobBroker::new());
        broker.enqueue(Job::with_id("j1", "q")).await.unwrap();

        let failing: JobHandler = Arc::new(|_| Box::pin(async { Err("model unavailable".into()) }));
        let worker = Worker::new(Arc::clone(&broker), failing);

        let err = worker.run_once().await.unwrap_err();
        assert!(matches!(err, QueueError::HandlerFailed { .. }));
        assert_eq!(broker.in_flight_count().await, 1);
        assert_eq!(broker.poll_result("j1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_run_drains_queue_until_close() {
        let broker = Arc::new(InMemoryJobBroker::new());
        for i in 0..3 {
            broker.enqueue(Job::with_id(format!("j{i}"), "q")).await.unwrap();
        }
        broker.close().await;

        let worker = Worker::new(Arc::clone(&broker), echo_handler());
        worker.run().await.unwrap();

        for i in 0..3 {
            assert!(broker.poll_result(&format!("j{i}")).await.unwrap().is_some());
        }
    }
}
