//! Workflow graph construction and static validation
//!
//! A [`WorkflowGraph`] is the builder: register steps, wire direct and
//! conditional edges, pick an entry point, then [`compile`] into an
//! executable [`Workflow`]. Compilation validates the whole edge set
//! statically, so a router that names an unregistered step is a build-time
//! [`EngineError::Configuration`], never a surprise at run time.
//!
//! ```rust
//! use cadence_core::{StateSchema, AppendReducer, StepResult, StepSpec, WorkflowGraph, END, START};
//! use cadence_checkpoint::InMemoryCheckpointStore;
//! use serde_json::json;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let schema = StateSchema::new().with_field("messages", Box::new(AppendReducer));
//! let mut graph = WorkflowGraph::new(schema);
//!
//! graph.add_step(StepSpec::new("classify", Arc::new(|ctx| Box::pin(async move {
//!     let _ = ctx;
//!     Ok(StepResult::update(json!({"category": "tech"})))
//! }))));
//! graph.add_step(StepSpec::new("answer", Arc::new(|ctx| Box::pin(async move {
//!     let _ = ctx;
//!     Ok(StepResult::update(json!({"messages": ["done"]})))
//! }))));
//!
//! graph.add_edge(START, "classify");
//! graph.add_conditional_edge(
//!     "classify",
//!     Arc::new(|state| state["category"].as_str().unwrap_or("general").to_string()),
//!     HashMap::from([
//!         ("tech".to_string(), "answer".to_string()),
//!         ("general".to_string(), "answer".to_string()),
//!     ]),
//! );
//! graph.add_edge("answer", END);
//!
//! let workflow = graph.compile(Arc::new(InMemoryCheckpointStore::new())).unwrap();
//! ```

use crate::error::{EngineError, Result};
use crate::executor::Workflow;
use crate::state::StateSchema;
use crate::step::StepSpec;
use cadence_checkpoint::CheckpointStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Virtual entry marker; `add_edge(START, step)` selects the entry step
pub const START: &str = "__start__";

/// Virtual terminal marker; an edge to `END` completes the run
pub const END: &str = "__end__";

/// Router function: pure, inspects state, returns a branch key
///
/// The key is looked up in the conditional edge's branch table; it is not a
/// step name by itself. Routers must be total over the category space they
/// declare, and must not touch anything but the state they are handed.
pub type RouterFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// An outgoing edge
#[derive(Clone)]
pub enum Edge {
    /// Unconditional transition to the named step (or [`END`])
    Direct(String),

    /// Transition chosen by a router at run time
    ///
    /// `branches` maps every key the router may return to its target step,
    /// which makes the full target set checkable at compile time.
    Conditional {
        router: RouterFn,
        branches: HashMap<String, String>,
    },
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Direct(to) => f.debug_tuple("Direct").field(to).finish(),
            Edge::Conditional { branches, .. } => f
                .debug_struct("Conditional")
                .field("branches", branches)
                .finish_non_exhaustive(),
        }
    }
}

/// Workflow graph builder
pub struct WorkflowGraph {
    steps: HashMap<String, StepSpec>,
    edges: HashMap<String, Vec<Edge>>,
    entry: Option<String>,
    schema: StateSchema,
}

impl WorkflowGraph {
    pub fn new(schema: StateSchema) -> Self {
        Self {
            steps: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            schema,
        }
    }

    /// Register a step; the name must be unique within the graph
    pub fn add_step(&mut self, spec: StepSpec) -> &mut Self {
        self.steps.insert(spec.name.clone(), spec);
        self
    }

    /// Add an unconditional edge
    ///
    /// `add_edge(START, step)` sets the entry step, same as
    /// [`set_entry`](Self::set_entry).
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        let from = from.into();
        let to = to.into();
        if from == START {
            self.entry = Some(to);
        } else {
            self.edges.entry(from).or_default().push(Edge::Direct(to));
        }
        self
    }

    /// Add a router-controlled edge
    pub fn add_conditional_edge(
        &mut self,
        from: impl Into<String>,
        router: RouterFn,
        branches: HashMap<String, String>,
    ) -> &mut Self {
        self.edges
            .entry(from.into())
            .or_default()
            .push(Edge::Conditional { router, branches });
        self
    }

    /// Set the entry step explicitly
    pub fn set_entry(&mut self, step: impl Into<String>) -> &mut Self {
        self.entry = Some(step.into());
        self
    }

    /// Validate the graph structure
    ///
    /// Checks that an entry step is configured and registered, that every
    /// edge source and target names a registered step (or [`END`]), that
    /// every conditional branch target is registered, and that each step has
    /// exactly one outgoing edge. Every violation is fatal.
    pub fn validate(&self) -> Result<()> {
        let entry = self
            .entry
            .as_deref()
            .ok_or_else(|| EngineError::Configuration("no entry step configured".to_string()))?;
        if !self.steps.contains_key(entry) {
            return Err(EngineError::Configuration(format!(
                "entry step '{entry}' is not registered"
            )));
        }

        for (from, edges) in &self.edges {
            if !self.steps.contains_key(from) {
                return Err(EngineError::Configuration(format!(
                    "edge source '{from}' is not registered"
                )));
            }
            if edges.len() != 1 {
                return Err(EngineError::Configuration(format!(
                    "step '{from}' has {} outgoing edges; exactly one is required",
                    edges.len()
                )));
            }
            match &edges[0] {
                Edge::Direct(to) => self.check_target(from, to)?,
                Edge::Conditional { branches, .. } => {
                    if branches.is_empty() {
                        return Err(EngineError::Configuration(format!(
                            "conditional edge from '{from}' declares no branches"
                        )));
                    }
                    for to in branches.values() {
                        self.check_target(from, to)?;
                    }
                }
            }
        }

        // Every step must lead somewhere, or the run could stall.
        for name in self.steps.keys() {
            if !self.edges.contains_key(name) {
                return Err(EngineError::Configuration(format!(
                    "step '{name}' has no outgoing edge"
                )));
            }
        }

        Ok(())
    }

    fn check_target(&self, from: &str, to: &str) -> Result<()> {
        if to != END && !self.steps.contains_key(to) {
            return Err(EngineError::Configuration(format!(
                "edge from '{from}' targets unregistered step '{to}'"
            )));
        }
        Ok(())
    }

    /// Validate and produce an executable [`Workflow`] bound to a store
    pub fn compile(self, store: Arc<dyn CheckpointStore>) -> Result<Workflow> {
        self.validate()?;

        let entry = self
            .entry
            .ok_or_else(|| EngineError::Configuration("no entry step configured".to_string()))?;
        let edges = self
            .edges
            .into_iter()
            .filter_map(|(from, mut edges)| edges.pop().map(|edge| (from, edge)))
            .collect();

        Ok(Workflow::new(self.steps, edges, entry, self.schema, store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{StepResult, update_step};
    use cadence_checkpoint::InMemoryCheckpointStore;
    use serde_json::json;

    fn noop(name: &str) -> StepSpec {
        StepSpec::new(name, update_step(|_| async { Ok(json!(null)) }))
    }

    fn graph_with(names: &[&str]) -> WorkflowGraph {
        let mut graph = WorkflowGraph::new(StateSchema::new());
        for name in names {
            graph.add_step(noop(name));
        }
        graph
    }

    #[test]
    fn test_validate_requires_entry() {
        let graph = graph_with(&["a"]);
        let err = graph.validate().unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_unregistered_edge_target() {
        let mut graph = graph_with(&["a"]);
        graph.add_edge(START, "a");
        graph.add_edge("a", "ghost");
        assert!(matches!(graph.validate(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_unregistered_branch_target() {
        let mut graph = graph_with(&["a"]);
        graph.add_edge(START, "a");
        graph.add_conditional_edge(
            "a",
            Arc::new(|_| "x".to_string()),
            HashMap::from([("x".to_string(), "ghost".to_string())]),
        );
        assert!(matches!(graph.validate(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_dangling_step() {
        let mut graph = graph_with(&["a", "b"]);
        graph.add_edge(START, "a");
        graph.add_edge("a", "b");
        // "b" has no outgoing edge
        assert!(matches!(graph.validate(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_multiple_outgoing_edges() {
        let mut graph = graph_with(&["a", "b"]);
        graph.add_edge(START, "a");
        graph.add_edge("a", "b");
        graph.add_edge("a", END);
        graph.add_edge("b", END);
        assert!(matches!(graph.validate(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_compile_valid_graph() {
        let mut graph = graph_with(&["a"]);
        graph.add_edge(START, "a");
        graph.add_edge("a", END);
        assert!(graph.compile(Arc::new(InMemoryCheckpointStore::new())).is_ok());
    }

    #[tokio::test]
    async fn test_step_result_suspend_shape() {
        // Builder-level sanity that a suspending executor is representable.
        let spec = StepSpec::new(
            "wait",
            Arc::new(|_ctx| {
                Box::pin(async { Ok(StepResult::suspend("human_input", json!({"query": "?"}))) })
            }),
        );
        let result = (spec.executor)(crate::step::StepContext::new(json!({}))).await.unwrap();
        assert!(matches!(result, StepResult::Suspend { .. }));
    }
}
