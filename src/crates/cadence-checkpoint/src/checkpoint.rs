//! Checkpoint data model
//!
//! A [`Checkpoint`] is a durable snapshot of one workflow thread: the state
//! after the most recently completed step, the step the executor will run
//! next, and, when the thread is waiting on external input, the suspension
//! payload that explains why.
//!
//! Checkpoints form an append-only line per thread. The `seq` field increases
//! strictly by 1 with every snapshot, so the highest sequence number is always
//! the current state, and a crash mid-write can never corrupt the previous
//! snapshot. Stores never mutate a checkpoint in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Checkpoint ID type
pub type CheckpointId = String;

/// Thread ID type
pub type ThreadId = String;

/// What produced a checkpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    /// Written when a thread is initialized from caller input
    Input,
    /// Written after a step completed inside the execution loop
    Loop,
    /// First checkpoint written after a suspended thread was resumed
    Resume,
}

/// Durable snapshot of one workflow thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version (currently 1)
    pub v: i32,

    /// Unique ID of this snapshot
    pub id: CheckpointId,

    /// Position in the thread's append-only line; strictly increasing by 1
    pub seq: u64,

    /// When the snapshot was taken
    pub ts: DateTime<Utc>,

    /// What produced this snapshot
    pub source: CheckpointSource,

    /// Workflow state after the last completed step (a JSON object)
    pub state: Value,

    /// Step the executor will run next; `None` means the run is terminal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_step: Option<String>,

    /// Whether the thread is halted waiting for external input
    pub suspended: bool,

    /// Short tag recorded by the suspending step saying why it halted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_reason: Option<String>,

    /// Opaque payload recorded by the suspending step, persisted verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_payload: Option<Value>,
}

impl Checkpoint {
    /// Current checkpoint format version
    pub const CURRENT_VERSION: i32 = 1;

    /// Create a running (non-suspended) checkpoint
    pub fn new(seq: u64, state: Value, pending_step: Option<String>, source: CheckpointSource) -> Self {
        Self {
            v: Self::CURRENT_VERSION,
            id: Uuid::new_v4().to_string(),
            seq,
            ts: Utc::now(),
            source,
            state,
            pending_step,
            suspended: false,
            suspend_reason: None,
            suspend_payload: None,
        }
    }

    /// Create a suspended checkpoint
    ///
    /// `pending_step` records the step that raised the suspension, so a later
    /// resume re-enters exactly there.
    pub fn suspended(
        seq: u64,
        state: Value,
        pending_step: String,
        reason: String,
        payload: Value,
        source: CheckpointSource,
    ) -> Self {
        Self {
            v: Self::CURRENT_VERSION,
            id: Uuid::new_v4().to_string(),
            seq,
            ts: Utc::now(),
            source,
            state,
            pending_step: Some(pending_step),
            suspended: true,
            suspend_reason: Some(reason),
            suspend_payload: Some(payload),
        }
    }

    /// True when the run reached a terminal step and is neither pending nor
    /// suspended
    pub fn is_terminal(&self) -> bool {
        self.pending_step.is_none() && !self.suspended
    }
}
