//! Error types for workflow construction and execution
//!
//! Errors fall into a few distinct families, and callers are expected to
//! dispatch on them:
//!
//! - [`EngineError::Configuration`] and
//!   [`EngineError::MissingRequiredField`] are fatal: the graph or the input
//!   is wrong, and retrying will not help.
//! - [`EngineError::ConcurrentModification`] is recoverable: another call
//!   advanced the thread first; reload and retry.
//! - [`EngineError::InvalidResumeState`] and [`EngineError::ThreadSuspended`]
//!   mean the call does not match the thread's current lifecycle; no state
//!   was mutated.
//! - [`EngineError::Store`] is fail-closed: the checkpoint did not durably
//!   persist, so the step is not complete and the whole call is safe to
//!   retry.
//! - [`EngineError::StepExecution`] surfaces a failing step. The checkpoint
//!   taken before that step remains the last durable state; retry policy
//!   belongs to the caller, and steps with irreversible side effects must
//!   tolerate at-least-once replay.
//!
//! Suspension is deliberately *not* an error. A suspended run is a normal
//! outcome, reported through `RunStatus::Suspended`.

use cadence_checkpoint::StoreError;
use thiserror::Error;

/// Convenience result type using [`EngineError`]
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised while building or executing a workflow
#[derive(Error, Debug)]
pub enum EngineError {
    /// Graph structure or routing is invalid
    ///
    /// Raised at compile time for edges that reference unregistered steps,
    /// and at run time when a router returns a branch key outside its
    /// declared branch table.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A step was about to run against a state missing a field it declared
    /// as required
    #[error("Step '{step}' requires field '{field}' which is missing from state")]
    MissingRequiredField { step: String, field: String },

    /// `resume` was called on a thread that is not suspended
    #[error("Thread '{thread_id}' is not suspended; nothing to resume")]
    InvalidResumeState { thread_id: String },

    /// `run` was called on a thread that is halted waiting for external input
    #[error("Thread '{thread_id}' is suspended; call resume to continue it")]
    ThreadSuspended { thread_id: String },

    /// Another call advanced this thread's checkpoint line first
    #[error("Concurrent modification on thread '{thread_id}'; reload and retry")]
    ConcurrentModification { thread_id: String },

    /// Checkpoint persistence failed; the step is not committed
    #[error("Checkpoint store error: {0}")]
    Store(StoreError),

    /// A step's own logic failed
    #[error("Step '{step}' execution failed: {source}")]
    StepExecution {
        step: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A tool call referenced a tool outside the allow-list, or an artifact
    /// path outside the permitted roots; rejected before execution
    #[error("Tool call rejected: {0}")]
    ToolRejected(String),

    /// State merge or schema validation failed
    #[error("State error: {0}")]
    State(#[from] crate::state::StateError),

    /// State could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Shorthand for a step execution failure
    pub fn step_execution(
        step: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::StepExecution {
            step: step.into(),
            source: source.into(),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConcurrentModification { thread_id, .. } => {
                Self::ConcurrentModification { thread_id }
            }
            other => Self::Store(other),
        }
    }
}
