//! Human escalation example
//!
//! The chat model escalates to a human by requesting the `ask_human` tool.
//! The run suspends with the question persisted in the checkpoint; an
//! operator (played inline here) reads it through `get_status` and resumes
//! the thread with a reply, which becomes the tool's return value.

use cadence_checkpoint::InMemoryCheckpointStore;
use cadence_core::escalation::{chat_step, tool_step, tools_router, ASK_HUMAN, BRANCH_END, BRANCH_TOOLS};
use cadence_core::{
    AppendReducer, Message, RunStatus, ScriptedChatModel, StateSchema, StepSpec, ToolCall,
    ToolRegistry, WorkflowGraph, END, START,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Human Escalation Example ===\n");

    // Scripted model: first it escalates, then it wraps up with the
    // human-provided answer in context.
    let model = Arc::new(ScriptedChatModel::new(vec![
        Message::assistant_with_tool_calls(
            "",
            vec![ToolCall::new(
                ASK_HUMAN,
                json!({"query": "Customer asks for a refund outside the 30-day window"}),
            )],
        ),
        Message::assistant("Good news: a specialist approved your refund as a one-time exception."),
    ]));

    let schema = StateSchema::new().with_field("messages", Box::new(AppendReducer));
    let mut graph = WorkflowGraph::new(schema);
    graph.add_step(StepSpec::new("chatbot", chat_step(model)));
    graph.add_step(StepSpec::new("tools", tool_step(Arc::new(ToolRegistry::new()))));
    graph.add_edge(START, "chatbot");
    graph.add_conditional_edge(
        "chatbot",
        tools_router(),
        HashMap::from([
            (BRANCH_TOOLS.to_string(), "tools".to_string()),
            (BRANCH_END.to_string(), END.to_string()),
        ]),
    );
    graph.add_edge("tools", "chatbot");

    let workflow = graph.compile(Arc::new(InMemoryCheckpointStore::new()))?;

    // Customer turn.
    let outcome = workflow
        .run(
            "customer-123",
            json!({"messages": [{"role": "user", "content": "I want a refund for an order from last year"}]}),
        )
        .await?;

    match outcome.status {
        RunStatus::Suspended { reason, .. } => println!("Run suspended ({reason})"),
        other => println!("Unexpected status: {other:?}"),
    }

    // Operator console: poll the thread, read the question, reply.
    if let Some(status) = workflow.get_status("customer-123").await? {
        if status.suspended {
            let query = status.suspend_payload.as_ref().map(|p| p["query"].clone());
            println!("--- HUMAN SUPPORT REQUIRED ---");
            println!("Customer query: {query:?}");
        }
    }

    let outcome = workflow
        .resume("customer-123", json!({"data": "Refund approved, reference #8841"}))
        .await?;

    println!("\nFinal status: {:?}", outcome.status);
    for message in outcome.state["messages"].as_array().into_iter().flatten() {
        println!("  [{}] {}", message["role"].as_str().unwrap_or("?"), message["content"]);
    }

    Ok(())
}
