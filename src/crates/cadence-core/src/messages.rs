//! Message records carried in workflow state
//!
//! The `messages` field of a workflow state is an append-only sequence of
//! these records. Assistant messages may additionally carry structured tool
//! calls, which the tool-execution step parses and dispatches.

use crate::tool::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who authored a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// One conversation message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,

    /// Structured tool invocations requested by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::of(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::of(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::of(MessageRole::Assistant, content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::of(MessageRole::Tool, content)
    }

    /// Assistant message requesting tool execution
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls,
        }
    }

    fn of(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// Deserialize the `messages` field of a state object
///
/// An absent field reads as an empty history.
pub fn messages_from_state(state: &Value) -> Result<Vec<Message>, serde_json::Error> {
    match state.get("messages") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone()),
    }
}

/// Last message in a state's history, if any
pub fn last_message(state: &Value) -> Result<Option<Message>, serde_json::Error> {
    Ok(messages_from_state(state)?.pop())
}
