//! Classify-and-route example
//!
//! A question is classified into a category, then a router picks the answer
//! step for that category. Every checkpoint lands in the in-memory store, so
//! the thread could be inspected or continued by another executor.

use cadence_checkpoint::InMemoryCheckpointStore;
use cadence_core::{update_step, StateSchema, StepSpec, WorkflowGraph, END, START};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Classify and Route Example ===\n");

    let mut graph = WorkflowGraph::new(StateSchema::new());

    graph.add_step(
        StepSpec::new(
            "classify",
            update_step(|state| async move {
                let question = state["question"].as_str().unwrap_or_default();
                let category = if question.contains("stack") || question.contains("compiler") {
                    "tech"
                } else {
                    "general"
                };
                println!("Classified as: {category}");
                Ok(json!({"category": category}))
            }),
        )
        .with_required_fields(vec!["question".to_string()]),
    );

    graph.add_step(StepSpec::new(
        "tech_answer",
        update_step(|state| async move {
            let question = state["question"].as_str().unwrap_or_default();
            Ok(json!({"answer": format!("[senior engineer] Looking at '{question}': check the borrow checker output first.")}))
        }),
    ));

    graph.add_step(StepSpec::new(
        "general_answer",
        update_step(|state| async move {
            let question = state["question"].as_str().unwrap_or_default();
            Ok(json!({"answer": format!("[assistant] Regarding '{question}': happy to help!")}))
        }),
    ));

    graph.add_edge(START, "classify");
    graph.add_conditional_edge(
        "classify",
        Arc::new(|state: &Value| state["category"].as_str().unwrap_or_default().to_string()),
        HashMap::from([
            ("tech".to_string(), "tech_answer".to_string()),
            ("general".to_string(), "general_answer".to_string()),
        ]),
    );
    graph.add_edge("tech_answer", END);
    graph.add_edge("general_answer", END);

    let workflow = graph.compile(Arc::new(InMemoryCheckpointStore::new()))?;

    for (thread, question) in [
        ("q-1", "why does the compiler complain about lifetimes"),
        ("q-2", "what time is the office open"),
    ] {
        let outcome = workflow.run(thread, json!({ "question": question })).await?;
        println!("{thread}: {}\n", outcome.state["answer"]);
    }

    Ok(())
}
