//! End-to-end test of the support-chat escalation pattern
//!
//! Mirrors a customer-support deployment: a chat step that may request the
//! `ask_human` tool, a tool step that suspends the thread for a human
//! operator, and a resume path that feeds the operator's reply back into the
//! conversation. The operator side uses only `get_status` and `resume`,
//! exactly as a separate console process would.

use cadence_checkpoint::InMemoryCheckpointStore;
use cadence_core::escalation::{chat_step, tool_step, tools_router, ASK_HUMAN, BRANCH_END, BRANCH_TOOLS};
use cadence_core::{
    AppendReducer, Message, RunStatus, ScriptedChatModel, StateSchema, StepSpec, ToolCall,
    ToolRegistry, Workflow, WorkflowGraph, END, START,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

fn support_workflow(model: Arc<ScriptedChatModel>, store: Arc<InMemoryCheckpointStore>) -> Workflow {
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

    graph.compile(store).unwrap()
}

#[tokio::test]
async fn test_direct_answer_completes_without_escalation() {
    let model = Arc::new(ScriptedChatModel::new(vec![Message::assistant(
        "You can reset your password from the login page.",
    )]));
    let workflow = support_workflow(model, Arc::new(InMemoryCheckpointStore::new()));

    let outcome = workflow
        .run(
            "customer-1",
            json!({"messages": [{"role": "user", "content": "How do I reset my password?"}]}),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.state["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_escalation_suspends_then_resumes_with_human_reply() {
    let model = Arc::new(ScriptedChatModel::new(vec![
        Message::assistant_with_tool_calls(
            "",
            vec![ToolCall::new(
                ASK_HUMAN,
                json!({"query": "Customer wants a refund outside the policy window"}),
            )],
        ),
        Message::assistant("A specialist approved your refund. It will arrive in 3-5 days."),
    ]));
    let store = Arc::new(InMemoryCheckpointStore::new());
    let workflow = support_workflow(model, Arc::clone(&store));

    // Customer turn: the model escalates, the run suspends.
    let outcome = workflow
        .run(
            "customer-2",
            json!({"messages": [{"role": "user", "content": "I want a refund for last year's order"}]}),
        )
        .await
        .unwrap();
    match &outcome.status {
        RunStatus::Suspended { reason, .. } => assert_eq!(reason, "human_input"),
        other => panic!("expected suspension, got {other:?}"),
    }

    // Operator console: read the persisted query out of band.
    let status = workflow.get_status("customer-2").await.unwrap().unwrap();
    assert!(status.suspended);
    let query = status.suspend_payload.unwrap()["query"].clone();
    assert_eq!(query, "Customer wants a refund outside the policy window");

    // Operator replies; the thread runs through to a final answer.
    let outcome = workflow
        .resume("customer-2", json!({"data": "Refund approved as a one-time exception"}))
        .await
        .unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);

    let messages = outcome.state["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2]["role"], "tool");
    assert_eq!(messages[2]["content"], "Refund approved as a one-time exception");
    assert!(messages[3]["content"]
        .as_str()
        .unwrap()
        .contains("specialist approved"));
}

#[tokio::test]
async fn test_operator_console_sees_suspension_from_second_process() {
    let model = Arc::new(ScriptedChatModel::new(vec![
        Message::assistant_with_tool_calls("", vec![ToolCall::new(ASK_HUMAN, json!({"query": "verify identity"}))]),
    ]));
    let store = Arc::new(InMemoryCheckpointStore::new());

    {
        let workflow = support_workflow(model, Arc::clone(&store));
        workflow
            .run("customer-3", json!({"messages": [{"role": "user", "content": "help"}]}))
            .await
            .unwrap();
    }

    // A separate console process rebuilds the workflow over the same store
    // and picks up the pending question. The final chat turn after the tool
    // reply needs its own scripted response.
    let console_model = Arc::new(ScriptedChatModel::new(vec![Message::assistant("All set.")]));
    let console = support_workflow(console_model, Arc::clone(&store));

    let status = console.get_status("customer-3").await.unwrap().unwrap();
    assert_eq!(status.suspend_payload.unwrap()["query"], "verify identity");

    let outcome = console
        .resume("customer-3", json!({"data": "identity confirmed"}))
        .await
        .unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
}
