//! Step functions and their results
//!
//! A step is the executor's unit of work and of checkpointing. Steps receive
//! a [`StepContext`] and return a [`StepResult`]: either a partial state
//! update to merge, or a suspension request that halts the whole run until an
//! external actor resumes it.
//!
//! Suspension is modelled as a plain return value, not an error or an unwind.
//! The executor's loop pattern-matches on the result; nothing else in the
//! engine treats it specially.
//!
//! # Re-entry contract
//!
//! When a suspended thread is resumed, the executor re-invokes the suspended
//! step *from its start* with [`StepContext::resume`] populated. The step's
//! suspension point then consumes that value instead of suspending again:
//!
//! ```rust,ignore
//! let reply = match ctx.take_resume() {
//!     Some(reply) => reply,
//!     None => return Ok(StepResult::suspend("human_input", json!({"query": question}))),
//! };
//! ```
//!
//! Because the whole body re-executes, steps must be idempotent up to their
//! suspension point: either perform no side effects before suspending, or key
//! them so a replay is harmless.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed error type step functions may return
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by a step function
pub type StepFuture = Pin<Box<dyn Future<Output = std::result::Result<StepResult, BoxError>> + Send>>;

/// A step function: async, owns its context, returns a [`StepResult`]
pub type StepFn = Arc<dyn Fn(StepContext) -> StepFuture + Send + Sync>;

/// What a step invocation receives
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Current workflow state (a JSON object)
    pub state: Value,

    /// Externally supplied data when re-entering after a suspension
    ///
    /// `None` on a normal invocation. On resume it carries the payload the
    /// external caller passed, exactly once.
    pub resume: Option<Value>,
}

impl StepContext {
    pub fn new(state: Value) -> Self {
        Self { state, resume: None }
    }

    /// Consume the resume payload, if this invocation is a re-entry
    pub fn take_resume(&mut self) -> Option<Value> {
        self.resume.take()
    }
}

/// What a step invocation produced
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    /// Partial state to merge through the workflow's schema
    ///
    /// May be `Null` for steps that advance the graph without touching state.
    Update(Value),

    /// Halt the run here and wait for external input
    ///
    /// The payload is opaque to the executor and persisted verbatim in the
    /// checkpoint, where polling clients can read it to decide how to
    /// respond. The reason is a short machine tag for the same audience.
    Suspend { reason: String, payload: Value },
}

impl StepResult {
    pub fn update(value: Value) -> Self {
        Self::Update(value)
    }

    pub fn suspend(reason: impl Into<String>, payload: Value) -> Self {
        Self::Suspend {
            reason: reason.into(),
            payload,
        }
    }
}

/// A named step with its executor and pre-invocation requirements
#[derive(Clone)]
pub struct StepSpec {
    /// Unique step name within the graph
    pub name: String,

    /// The step function
    pub executor: StepFn,

    /// Fields that must be present and non-null in state before this step
    /// may run; violations fail before invocation
    pub required_fields: Vec<String>,
}

impl StepSpec {
    pub fn new(name: impl Into<String>, executor: StepFn) -> Self {
        Self {
            name: name.into(),
            executor,
            required_fields: Vec::new(),
        }
    }

    pub fn with_required_fields(mut self, fields: Vec<String>) -> Self {
        self.required_fields = fields;
        self
    }
}

impl std::fmt::Debug for StepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepSpec")
            .field("name", &self.name)
            .field("required_fields", &self.required_fields)
            .finish_non_exhaustive()
    }
}

/// Wrap a plain async closure returning a state update into a [`StepFn`]
///
/// Convenience for the common case of steps that never suspend.
pub fn update_step<F, Fut>(f: F) -> StepFn
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<Value, BoxError>> + Send + 'static,
{
    Arc::new(move |ctx: StepContext| {
        let fut = f(ctx.state);
        Box::pin(async move { fut.await.map(StepResult::Update) })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_step_wraps_closure() {
        let step = update_step(|state| async move {
            let n = state["n"].as_i64().unwrap_or(0);
            Ok(json!({"n": n + 1}))
        });

        let result = step(StepContext::new(json!({"n": 1}))).await.unwrap();
        assert_eq!(result, StepResult::Update(json!({"n": 2})));
    }

    #[test]
    fn test_take_resume_consumes_once() {
        let mut ctx = StepContext {
            state: json!({}),
            resume: Some(json!({"data": "go ahead"})),
        };
        assert_eq!(ctx.take_resume(), Some(json!({"data": "go ahead"})));
        assert_eq!(ctx.take_resume(), None);
    }

    #[test]
    fn test_suspend_constructor() {
        let result = StepResult::suspend("human_input", json!({"query": "need human"}));
        match result {
            StepResult::Suspend { reason, payload } => {
                assert_eq!(reason, "human_input");
                assert_eq!(payload, json!({"query": "need human"}));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
