//! Error types for queue operations

use thiserror::Error;

/// Boxed error type job handlers may return
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors that can occur on the job queue
#[derive(Error, Debug)]
pub enum QueueError {
    /// The broker was closed; no more jobs will be delivered
    #[error("Queue is closed")]
    Closed,

    /// A live result already exists for this job; result cells are
    /// write-once until they expire
    #[error("Result already published for job '{0}'")]
    ResultAlreadyPublished(String),

    /// The job id does not match any in-flight job
    #[error("Unknown job '{0}'")]
    UnknownJob(String),

    /// The job handler failed; the job stays unacked and redeliverable
    #[error("Handler failed for job '{job_id}': {source}")]
    HandlerFailed {
        job_id: String,
        #[source]
        source: BoxError,
    },

    /// Result polling gave up after its configured attempts
    #[error("No result for job '{job_id}' after {attempts} attempts")]
    PollTimeout { job_id: String, attempts: usize },
}
