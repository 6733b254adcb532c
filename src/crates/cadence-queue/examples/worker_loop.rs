//! Producer / worker / polling-client example
//!
//! Three roles that would normally live in separate processes, sharing one
//! broker: a producer enqueues a question, a worker answers it and publishes
//! the result with a one-hour TTL, and a client polls until the answer
//! appears.

use cadence_queue::{await_result, InMemoryJobBroker, Job, JobBroker, PollConfig, Worker};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Job Queue Worker Example ===\n");

    let broker = Arc::new(InMemoryJobBroker::new());

    // Worker: blocks on the queue, processes, publishes, acks.
    let worker_task = tokio::spawn({
        let broker = Arc::clone(&broker);
        async move {
            let worker = Worker::new(
                broker,
                Arc::new(|job: Job| {
                    Box::pin(async move {
                        println!("[worker] processing job {}", job.job_id);
                        Ok(format!("Answer generated for: {}", job.query))
                    })
                }),
            )
            .with_result_ttl(Duration::from_secs(3600));
            worker.run().await
        }
    });

    // Producer: enqueue one job.
    let job = Job::new("What does the document say about data retention?");
    let job_id = job.job_id.clone();
    println!("[producer] enqueued job {job_id}");
    broker.enqueue(job).await?;

    // Client: poll with a bounded budget.
    let config = PollConfig {
        interval: Duration::from_millis(200),
        max_attempts: 25,
        jitter: true,
    };
    let answer = await_result(broker.as_ref(), &job_id, config).await?;
    println!("[client] {answer}");

    broker.close().await;
    worker_task.await??;
    Ok(())
}
