//! Human-escalation building blocks
//!
//! Ready-made steps for the support-chat pattern: a chat step that lets the
//! model answer or request tools, a router that branches on whether tools
//! were requested, and a tool-execution step where the `ask_human` tool is
//! implemented through the suspension protocol rather than a handler.
//!
//! The escalation flow end to end:
//!
//! 1. The chat step appends an assistant message; when the model cannot help
//!    it requests the `ask_human` tool with a `query` argument.
//! 2. The router sends the thread to the tool step.
//! 3. The tool step sees an `ask_human` call with no resume data and
//!    suspends, persisting `{"query": ...}` for the operator console.
//! 4. A human reads the query through `get_status`, answers, and the thread
//!    is resumed with `{"data": <reply>}`.
//! 5. The tool step re-runs from its start, now consuming the reply as the
//!    tool's return value, and appends it as a tool message. No other tool
//!    is dispatched before the suspension point, so the replay performs no
//!    duplicate side effects.

use crate::llm::ChatModel;
use crate::messages::{last_message, messages_from_state, Message, MessageRole};
use crate::step::{StepFn, StepResult};
use crate::graph::RouterFn;
use crate::tool::ToolRegistry;
use serde_json::{json, Value};
use std::sync::Arc;

/// Tool name the model uses to request a human
pub const ASK_HUMAN: &str = "ask_human";

/// Router branch key for "assistant requested tools"
pub const BRANCH_TOOLS: &str = "tools";

/// Router branch key for "assistant answered directly"
pub const BRANCH_END: &str = "end";

/// Chat step: send the conversation to the model, append its reply
pub fn chat_step(model: Arc<dyn ChatModel>) -> StepFn {
    Arc::new(move |ctx| {
        let model = Arc::clone(&model);
        Box::pin(async move {
            let history = messages_from_state(&ctx.state)?;
            let reply = model.complete(&history).await?;
            Ok(StepResult::Update(json!({ "messages": [reply] })))
        })
    })
}

/// Router: [`BRANCH_TOOLS`] when the last assistant message carries tool
/// calls, [`BRANCH_END`] otherwise
pub fn tools_router() -> RouterFn {
    Arc::new(|state| {
        let wants_tools = last_message(state)
            .ok()
            .flatten()
            .map(|msg| msg.role == MessageRole::Assistant && !msg.tool_calls.is_empty())
            .unwrap_or(false);
        if wants_tools { BRANCH_TOOLS } else { BRANCH_END }.to_string()
    })
}

/// Tool-execution step with human escalation
///
/// Executes the tool calls of the last assistant message through the
/// registry's allow-list. An `ask_human` call is special-cased: on first
/// entry the step suspends with the query before dispatching anything, and
/// on re-entry the resume payload's `data` field becomes the tool's result.
pub fn tool_step(registry: Arc<ToolRegistry>) -> StepFn {
    Arc::new(move |mut ctx| {
        let registry = Arc::clone(&registry);
        Box::pin(async move {
            let message = last_message(&ctx.state)?.ok_or("tool step ran on an empty conversation")?;
            if message.role != MessageRole::Assistant || message.tool_calls.is_empty() {
                return Err("tool step requires an assistant message with tool calls".into());
            }

            let mut resume = ctx.take_resume();

            // Suspend before running anything else, so resuming never
            // replays an already-executed tool.
            if resume.is_none() {
                if let Some(call) = message.tool_calls.iter().find(|c| c.name == ASK_HUMAN) {
                    let query = call.arguments.get("query").cloned().unwrap_or(Value::Null);
                    return Ok(StepResult::suspend("human_input", json!({ "query": query })));
                }
            }

            let mut replies = Vec::with_capacity(message.tool_calls.len());
            for call in &message.tool_calls {
                if call.name == ASK_HUMAN {
                    let payload = resume
                        .take()
                        .ok_or("ask_human call without resume data")?;
                    let content = match payload.get("data") {
                        Some(Value::String(text)) => text.clone(),
                        Some(other) => other.to_string(),
                        None => payload.to_string(),
                    };
                    replies.push(Message::tool(content));
                } else {
                    let output = registry.dispatch(call).await?;
                    replies.push(Message::tool(output.to_string()));
                }
            }

            Ok(StepResult::Update(json!({ "messages": replies })))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepContext;
    use crate::tool::ToolCall;

    fn state_with_tool_call(name: &str, arguments: Value) -> Value {
        json!({"messages": [
            {"role": "user", "content": "I need help"},
            {"role": "assistant", "content": "", "tool_calls": [
                {"name": name, "arguments": arguments},
            ]},
        ]})
    }

    #[tokio::test]
    async fn test_tool_step_suspends_on_ask_human() {
        let step = tool_step(Arc::new(ToolRegistry::new()));
        let state = state_with_tool_call(ASK_HUMAN, json!({"query": "refund policy?"}));

        let result = step(StepContext::new(state)).await.unwrap();
        match result {
            StepResult::Suspend { reason, payload } => {
                assert_eq!(reason, "human_input");
                assert_eq!(payload, json!({"query": "refund policy?"}));
            }
            other => panic!("expected suspension, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tool_step_consumes_resume_data() {
        let step = tool_step(Arc::new(ToolRegistry::new()));
        let state = state_with_tool_call(ASK_HUMAN, json!({"query": "refund policy?"}));

        let mut ctx = StepContext::new(state);
        ctx.resume = Some(json!({"data": "30 days, no questions asked"}));

        let result = step(ctx).await.unwrap();
        match result {
            StepResult::Update(update) => {
                assert_eq!(
                    update["messages"][0],
                    serde_json::to_value(Message::tool("30 days, no questions asked")).unwrap()
                );
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tool_step_dispatches_registered_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(
            "lookup_order",
            Arc::new(|args| Box::pin(async move { Ok(json!({"status": "shipped", "order": args["id"]})) })),
        );
        let step = tool_step(Arc::new(registry));
        let state = state_with_tool_call("lookup_order", json!({"id": 42}));

        let result = step(StepContext::new(state)).await.unwrap();
        match result {
            StepResult::Update(update) => {
                let content = update["messages"][0]["content"].as_str().unwrap();
                assert!(content.contains("shipped"));
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tool_step_rejects_unknown_tool() {
        let step = tool_step(Arc::new(ToolRegistry::new()));
        let state = state_with_tool_call("delete_database", json!({}));

        let err = step(StepContext::new(state)).await.unwrap_err();
        assert!(err.to_string().contains("allow-list"));
    }

    #[test]
    fn test_tools_router_branches() {
        let router = tools_router();

        let with_tools = state_with_tool_call(ASK_HUMAN, json!({"query": "?"}));
        assert_eq!(router(&with_tools), BRANCH_TOOLS);

        let plain = json!({"messages": [
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": "hello"},
        ]});
        assert_eq!(router(&plain), BRANCH_END);

        assert_eq!(router(&json!({})), BRANCH_END);
    }

    #[tokio::test]
    async fn test_chat_step_appends_reply() {
        use crate::llm::ScriptedChatModel;

        let model = Arc::new(ScriptedChatModel::new(vec![Message::assistant("hello there")]));
        let step = chat_step(model);

        let result = step(StepContext::new(json!({"messages": [
            {"role": "user", "content": "hi"},
        ]})))
        .await
        .unwrap();

        match result {
            StepResult::Update(update) => {
                assert_eq!(update["messages"][0]["content"], "hello there");
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tool_step_errors_without_tool_calls() {
        let step = tool_step(Arc::new(ToolRegistry::new()));
        let state = json!({"messages": [{"role": "user", "content": "hi"}]});
        assert!(step(StepContext::new(state)).await.is_err());
    }

    #[tokio::test]
    async fn test_tool_call_parse_matches_wire_shape() {
        // The wire shape the chat model produces must parse into ToolCall.
        let raw = json!({"name": "ask_human", "arguments": {"query": "escalate?"}});
        let call: ToolCall = serde_json::from_value(raw).unwrap();
        assert_eq!(call.name, ASK_HUMAN);
    }
}
