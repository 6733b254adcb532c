//! Integration tests for worker crash recovery
//!
//! The contract under test: a worker crash mid-processing must leave the job
//! recoverable, and recovery must end with exactly one published result for
//! that job id.

use cadence_queue::{await_result, InMemoryJobBroker, Job, JobBroker, PollConfig, QueueError, Worker};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_crashed_worker_job_is_redelivered_and_answered_once() {
    let broker = Arc::new(InMemoryJobBroker::new());
    broker
        .enqueue(Job::with_id("j1", "summarize the report"))
        .await
        .unwrap();

    // First worker "crashes": it dequeues and is killed before acking.
    let crashing = tokio::spawn({
        let broker = Arc::clone(&broker);
        async move {
            let _job = broker.dequeue_blocking().await.unwrap();
            // Simulates the process dying mid-handler.
            std::future::pending::<()>().await;
        }
    });
    tokio::task::yield_now().await;
    crashing.abort();
    assert_eq!(broker.in_flight_count().await, 1);
    assert_eq!(broker.poll_result("j1").await.unwrap(), None);

    // Recovery pass returns the job to the queue; a healthy worker finishes it.
    assert_eq!(broker.redeliver_unacked().await.unwrap(), 1);

    let attempts = Arc::new(AtomicUsize::new(0));
    let handler_attempts = Arc::clone(&attempts);
    let worker = Worker::new(
        Arc::clone(&broker),
        Arc::new(move |job: Job| {
            let attempts = Arc::clone(&handler_attempts);
            Box::pin(async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok(format!("done: {}", job.query))
            })
        }),
    );
    worker.run_once().await.unwrap();

    // Exactly one processing attempt succeeded, exactly one result exists,
    // and a duplicate publish for the same id is refused.
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(
        broker.poll_result("j1").await.unwrap().as_deref(),
        Some("done: summarize the report")
    );
    assert!(matches!(
        broker
            .publish_result("j1", "duplicate", Duration::from_secs(60))
            .await
            .unwrap_err(),
        QueueError::ResultAlreadyPublished(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_producer_worker_client_roundtrip() {
    let broker = Arc::new(InMemoryJobBroker::new());

    // Worker process: runs until the broker closes.
    let worker_task = tokio::spawn({
        let broker = Arc::clone(&broker);
        async move {
            let worker = Worker::new(
                broker,
                Arc::new(|job: Job| Box::pin(async move { Ok(format!("answer for: {}", job.query)) })),
            );
            worker.run().await
        }
    });

    // Producer publishes, client polls.
    let job = Job::new("what is in chapter 3?");
    let job_id = job.job_id.clone();
    broker.enqueue(job).await.unwrap();

    let answer = await_result(broker.as_ref(), &job_id, PollConfig::default())
        .await
        .unwrap();
    assert_eq!(answer, "answer for: what is in chapter 3?");

    broker.close().await;
    worker_task.await.unwrap().unwrap();
}
