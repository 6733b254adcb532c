//! # cadence-core - Checkpointed Workflow Execution
//!
//! A graph-structured workflow executor with durable checkpointing,
//! conditional branching, and suspend/resume for human-in-the-loop steps.
//!
//! ## Model
//!
//! A workflow is a set of named **steps** wired by direct and
//! router-controlled edges, compiled once against a
//! [`CheckpointStore`](cadence_checkpoint::CheckpointStore). Each **thread**
//! (one logical run, identified by an opaque id) owns an append-only line of
//! checkpoints; the executor persists one checkpoint per completed step, so
//! a process restart resumes exactly where the last durable snapshot points.
//!
//! A step can halt the whole run by returning
//! [`StepResult::Suspend`](step::StepResult::Suspend). The run ends with a
//! `Suspended` status, a polling client reads the persisted payload through
//! [`Workflow::get_status`](executor::Workflow::get_status), and a separate
//! caller continues the thread with
//! [`Workflow::resume`](executor::Workflow::resume), whose data re-enters
//! the suspended step as the return value of its interrupted call.
//!
//! ## Quick start
//!
//! ```rust
//! use cadence_core::{
//!     AppendReducer, StateSchema, StepResult, StepSpec, WorkflowGraph, RunStatus, END, START,
//! };
//! use cadence_checkpoint::InMemoryCheckpointStore;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = StateSchema::new().with_field("messages", Box::new(AppendReducer));
//!     let mut graph = WorkflowGraph::new(schema);
//!
//!     graph.add_step(StepSpec::new("greet", Arc::new(|ctx| Box::pin(async move {
//!         let _ = ctx;
//!         Ok(StepResult::update(json!({
//!             "messages": [{"role": "assistant", "content": "hello"}]
//!         })))
//!     }))));
//!     graph.add_edge(START, "greet");
//!     graph.add_edge("greet", END);
//!
//!     let workflow = graph.compile(Arc::new(InMemoryCheckpointStore::new()))?;
//!     let outcome = workflow
//!         .run("t1", json!({"messages": [{"role": "user", "content": "hi"}]}))
//!         .await?;
//!
//!     assert_eq!(outcome.status, RunStatus::Completed);
//!     assert_eq!(outcome.state["messages"].as_array().unwrap().len(), 2);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod escalation;
pub mod executor;
pub mod graph;
pub mod llm;
pub mod messages;
pub mod state;
pub mod step;
pub mod tool;

pub use error::{EngineError, Result};
pub use executor::{RunOutcome, RunStatus, ThreadStatus, Workflow, DEFAULT_MAX_STEPS};
pub use graph::{Edge, RouterFn, WorkflowGraph, END, START};
pub use llm::{ChatModel, ScriptedChatModel};
pub use messages::{last_message, messages_from_state, Message, MessageRole};
pub use state::{
    missing_required, AppendReducer, MergeReducer, OverwriteReducer, Reducer, StateError,
    StateSchema,
};
pub use step::{update_step, BoxError, StepContext, StepFn, StepFuture, StepResult, StepSpec};
pub use tool::{ToolCall, ToolError, ToolHandler, ToolRegistry};
