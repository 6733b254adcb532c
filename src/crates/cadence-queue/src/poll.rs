//! Bounded result polling
//!
//! Clients wait for a job's answer by polling its result cell at a fixed
//! interval, with a little jitter so a fleet of clients does not hit the
//! broker in lockstep. The wait is bounded: after `max_attempts` misses the
//! call gives up with [`QueueError::PollTimeout`] instead of sleeping
//! forever.

use crate::broker::JobBroker;
use crate::error::{QueueError, Result};
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Polling cadence and bounds
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Base delay between attempts
    pub interval: Duration,

    /// Give up after this many misses
    pub max_attempts: usize,

    /// Add up to a quarter-interval of random delay per attempt
    pub jitter: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
            jitter: true,
        }
    }
}

/// Poll until the job's answer appears or the attempt budget runs out
pub async fn await_result<B>(broker: &B, job_id: &str, config: PollConfig) -> Result<String>
where
    B: JobBroker + ?Sized,
{
    for attempt in 1..=config.max_attempts {
        if let Some(answer) = broker.poll_result(job_id).await? {
            return Ok(answer);
        }
        debug!(job_id, attempt, "result not ready");

        if attempt < config.max_attempts {
            tokio::time::sleep(delay_for(&config)).await;
        }
    }

    Err(QueueError::PollTimeout {
        job_id: job_id.to_string(),
        attempts: config.max_attempts,
    })
}

fn delay_for(config: &PollConfig) -> Duration {
    if !config.jitter {
        return config.interval;
    }
    let quarter = (config.interval.as_millis() / 4) as u64;
    let jitter = if quarter == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=quarter)
    };
    config.interval + Duration::from_millis(jitter)
}
