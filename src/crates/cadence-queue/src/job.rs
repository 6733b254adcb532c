//! Job and result records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// One unit of queued work
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Unique job id; result cells are keyed by it
    pub job_id: String,

    /// The question or request to process
    pub query: String,

    /// When the producer enqueued the job
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    /// Create a job with a fresh id
    pub fn new(query: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), query)
    }

    /// Create a job under a caller-chosen id
    pub fn with_id(job_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            query: query.into(),
            enqueued_at: Utc::now(),
        }
    }
}

/// A published answer with its expiry
///
/// Write-once per job id while live; polling clients read without consuming,
/// and an expired cell reads as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub job_id: String,
    pub answer: String,
    pub ttl: Duration,
}

impl JobResult {
    pub fn new(job_id: impl Into<String>, answer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            job_id: job_id.into(),
            answer: answer.into(),
            ttl,
        }
    }
}
