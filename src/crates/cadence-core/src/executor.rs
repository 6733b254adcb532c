//! Workflow execution
//!
//! [`Workflow`] drives a compiled graph against a checkpoint store. Every
//! call follows the same shape: load the thread's latest checkpoint (or
//! initialize one), then loop invoking the current step, merging its partial
//! result through the state schema, and persisting a new checkpoint before
//! moving on. The checkpoint write is the only commit point: a step whose
//! checkpoint did not durably persist never happened as far as any later
//! call can observe.
//!
//! Per-thread writes are serialized by the store's check-and-set: of two
//! calls racing on the same thread, exactly one commits each contested
//! checkpoint and the other surfaces
//! [`EngineError::ConcurrentModification`]. Distinct threads never
//! coordinate.
//!
//! A step may halt the run by returning `StepResult::Suspend`. The
//! suspension payload is persisted with the checkpoint, `run` returns
//! `RunStatus::Suspended`, and a separate process later inspects the thread
//! through [`Workflow::get_status`] and continues it with
//! [`Workflow::resume`]. Suspension is a normal outcome for a call, not a
//! failure.

use crate::error::{EngineError, Result};
use crate::graph::{Edge, END};
use crate::state::{missing_required, StateSchema};
use crate::step::{StepContext, StepResult, StepSpec};
use cadence_checkpoint::{Checkpoint, CheckpointSource, CheckpointStore};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default bound on steps executed per call; a graph that exceeds it is
/// treated as mis-wired rather than allowed to loop forever
pub const DEFAULT_MAX_STEPS: usize = 25;

/// How a `run`/`resume` call ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// The run reached a terminal edge
    Completed,

    /// A step halted the run awaiting external input
    Suspended { reason: String, payload: Value },
}

/// Final state and status of a `run`/`resume` call
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub state: Value,
    pub status: RunStatus,
}

/// Non-mutating view of a thread, for polling clients
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadStatus {
    /// State as of the latest checkpoint
    pub state: Value,

    /// Step the executor would run next; `None` means the run is terminal
    pub next_step: Option<String>,

    /// Whether the thread is halted awaiting external input
    pub suspended: bool,

    /// Why the thread suspended, when it did
    pub suspend_reason: Option<String>,

    /// Payload recorded by the suspending step, verbatim
    pub suspend_payload: Option<Value>,
}

/// An executable workflow: compiled graph + checkpoint store
///
/// Built by [`WorkflowGraph::compile`](crate::graph::WorkflowGraph::compile).
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct Workflow {
    steps: HashMap<String, StepSpec>,
    edges: HashMap<String, Edge>,
    entry: String,
    schema: StateSchema,
    store: Arc<dyn CheckpointStore>,
    max_steps: usize,
}

impl Workflow {
    pub(crate) fn new(
        steps: HashMap<String, StepSpec>,
        edges: HashMap<String, Edge>,
        entry: String,
        schema: StateSchema,
        store: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            steps,
            edges,
            entry,
            schema,
            store,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Override the per-call step bound
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Execute a thread until it completes or suspends
    ///
    /// A new thread is initialized from `input_delta` (merged into an empty
    /// state through the schema) and starts at the entry step. An existing
    /// thread picks up where its latest checkpoint points: at the pending
    /// step after an interrupted run, or back at the entry step for a new
    /// turn on a terminal thread. In both existing cases `input_delta` is
    /// merged in first and checkpointed before any step runs, so caller
    /// input survives a crash.
    ///
    /// Fails with [`EngineError::ThreadSuspended`] when the thread is
    /// waiting on [`resume`](Self::resume); nothing is mutated in that case.
    pub async fn run(&self, thread_id: &str, input_delta: Value) -> Result<RunOutcome> {
        let latest = self.store.get_latest(thread_id).await?;

        match latest {
            None => {
                info!(thread_id, "starting new thread");
                let mut state = Value::Object(Default::default());
                self.schema.apply(&mut state, &input_delta)?;

                let snapshot = Checkpoint::new(
                    0,
                    state.clone(),
                    Some(self.entry.clone()),
                    CheckpointSource::Input,
                );
                self.store.put(thread_id, snapshot, None).await?;

                self.execute_from(thread_id, state, self.entry.clone(), 0, None, CheckpointSource::Loop)
                    .await
            }
            Some(checkpoint) if checkpoint.suspended => {
                warn!(thread_id, "run called on suspended thread");
                Err(EngineError::ThreadSuspended {
                    thread_id: thread_id.to_string(),
                })
            }
            Some(checkpoint) => {
                // Interrupted run resumes at its pending step; a terminal
                // thread starts a fresh turn from the entry step.
                let current = checkpoint
                    .pending_step
                    .clone()
                    .unwrap_or_else(|| self.entry.clone());
                info!(thread_id, seq = checkpoint.seq, step = %current, "continuing thread");

                let mut state = checkpoint.state;
                self.schema.apply(&mut state, &input_delta)?;

                let seq = checkpoint.seq + 1;
                let snapshot = Checkpoint::new(
                    seq,
                    state.clone(),
                    Some(current.clone()),
                    CheckpointSource::Input,
                );
                self.store
                    .put(thread_id, snapshot, Some(checkpoint.seq))
                    .await?;

                self.execute_from(thread_id, state, current, seq, None, CheckpointSource::Loop)
                    .await
            }
        }
    }

    /// Continue a suspended thread with externally supplied data
    ///
    /// Valid only when the latest checkpoint is suspended; anything else is
    /// [`EngineError::InvalidResumeState`] with no state mutation. The
    /// suspended step is re-entered from its start with `resume_data` in its
    /// context; its suspension point consumes that value as the return value
    /// of the call that originally suspended.
    pub async fn resume(&self, thread_id: &str, resume_data: Value) -> Result<RunOutcome> {
        let checkpoint = self
            .store
            .get_latest(thread_id)
            .await?
            .filter(|cp| cp.suspended)
            .ok_or_else(|| EngineError::InvalidResumeState {
                thread_id: thread_id.to_string(),
            })?;

        let current = checkpoint.pending_step.clone().ok_or_else(|| {
            EngineError::Configuration(format!(
                "suspended checkpoint for thread '{thread_id}' has no pending step"
            ))
        })?;
        info!(thread_id, seq = checkpoint.seq, step = %current, "resuming suspended thread");

        self.execute_from(
            thread_id,
            checkpoint.state,
            current,
            checkpoint.seq,
            Some(resume_data),
            CheckpointSource::Resume,
        )
        .await
    }

    /// Inspect a thread without mutating it
    ///
    /// Returns `None` for a thread with no checkpoints. Reads only the
    /// latest checkpoint; a concurrently advancing run may make the answer
    /// stale by the time the caller acts on it, which polling clients must
    /// tolerate.
    pub async fn get_status(&self, thread_id: &str) -> Result<Option<ThreadStatus>> {
        Ok(self.store.get_latest(thread_id).await?.map(|cp| ThreadStatus {
            state: cp.state,
            next_step: cp.pending_step,
            suspended: cp.suspended,
            suspend_reason: cp.suspend_reason,
            suspend_payload: cp.suspend_payload,
        }))
    }

    /// Whether no checkpoint exists yet for this thread
    pub async fn is_new(&self, thread_id: &str) -> Result<bool> {
        Ok(self.store.is_new(thread_id).await?)
    }

    /// Remove a thread's entire checkpoint line
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        Ok(self.store.delete_thread(thread_id).await?)
    }

    /// The step-invoke / merge / persist loop shared by `run` and `resume`
    ///
    /// `seq` is the sequence number of the checkpoint the caller just
    /// observed (and, for `run`, wrote); every persisted snapshot advances
    /// it by exactly one with a check-and-set on the predecessor.
    async fn execute_from(
        &self,
        thread_id: &str,
        mut state: Value,
        mut current: String,
        mut seq: u64,
        mut resume: Option<Value>,
        mut source: CheckpointSource,
    ) -> Result<RunOutcome> {
        for _ in 0..self.max_steps {
            let spec = self.steps.get(&current).ok_or_else(|| {
                EngineError::Configuration(format!("step '{current}' is not registered"))
            })?;

            if let Some(field) = missing_required(&state, &spec.required_fields) {
                return Err(EngineError::MissingRequiredField {
                    step: current.clone(),
                    field: field.to_string(),
                });
            }

            debug!(thread_id, step = %current, seq, "invoking step");
            let context = StepContext {
                state: state.clone(),
                resume: resume.take(),
            };
            let result = (spec.executor)(context)
                .await
                .map_err(|err| step_error(&current, err))?;

            match result {
                StepResult::Suspend { reason, payload } => {
                    debug!(thread_id, step = %current, reason = %reason, "step suspended");
                    let snapshot = Checkpoint::suspended(
                        seq + 1,
                        state.clone(),
                        current.clone(),
                        reason.clone(),
                        payload.clone(),
                        source,
                    );
                    self.store.put(thread_id, snapshot, Some(seq)).await?;

                    return Ok(RunOutcome {
                        state,
                        status: RunStatus::Suspended { reason, payload },
                    });
                }
                StepResult::Update(update) => {
                    self.schema.apply(&mut state, &update)?;
                    let next = self.next_step(&current, &state)?;

                    seq += 1;
                    let snapshot =
                        Checkpoint::new(seq, state.clone(), next.clone(), source);
                    self.store.put(thread_id, snapshot, Some(seq - 1)).await?;
                    source = CheckpointSource::Loop;

                    match next {
                        None => {
                            info!(thread_id, seq, "thread completed");
                            return Ok(RunOutcome {
                                state,
                                status: RunStatus::Completed,
                            });
                        }
                        Some(step) => current = step,
                    }
                }
            }
        }

        Err(EngineError::Configuration(format!(
            "thread '{thread_id}' exceeded {} steps without reaching a terminal edge",
            self.max_steps
        )))
    }

    /// Resolve the step after `current`, consulting the router for
    /// conditional edges; `None` means the run is terminal
    fn next_step(&self, current: &str, state: &Value) -> Result<Option<String>> {
        let edge = self.edges.get(current).ok_or_else(|| {
            EngineError::Configuration(format!("step '{current}' has no outgoing edge"))
        })?;

        let target = match edge {
            Edge::Direct(to) => to.clone(),
            Edge::Conditional { router, branches } => {
                let key = router(state);
                branches
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| {
                        EngineError::Configuration(format!(
                            "router for step '{current}' returned undeclared branch '{key}'"
                        ))
                    })?
            }
        };

        if target == END {
            Ok(None)
        } else {
            Ok(Some(target))
        }
    }
}

/// Classify a step failure
///
/// Tool-layer rejections (disallowed tool, artifact path outside the
/// permitted roots) surface as validation failures; everything else is a
/// step execution failure. Either way the step's checkpoint was never
/// written.
fn step_error(step: &str, err: crate::step::BoxError) -> EngineError {
    match err.downcast::<crate::tool::ToolError>() {
        Ok(tool_err) if tool_err.is_rejection() => EngineError::ToolRejected(tool_err.to_string()),
        Ok(tool_err) => EngineError::step_execution(step, *tool_err),
        Err(err) => EngineError::step_execution(step, err),
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("entry", &self.entry)
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}
