//! Chat-model boundary
//!
//! The engine orchestrates workflows; it does not speak to model providers.
//! Steps that need an LLM receive an injected [`ChatModel`] implementation
//! through their constructor, never a process-wide singleton. The trait is
//! deliberately minimal: messages in, one message out. Prompt construction,
//! model selection, retries, and token accounting all live behind the
//! implementation.

use crate::messages::Message;
use crate::step::BoxError;
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// A chat-completion model consumed as a black box
///
/// Implementations must be `Send + Sync`; share them across steps with
/// `Arc<dyn ChatModel>`.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next message for a conversation
    async fn complete(&self, messages: &[Message]) -> Result<Message, BoxError>;
}

/// Scripted model for tests and examples
///
/// Returns its queued responses in order and fails when the script runs dry,
/// which makes an unexpected extra model call a visible test failure instead
/// of a silent default.
#[derive(Debug, Default)]
pub struct ScriptedChatModel {
    responses: Mutex<VecDeque<Message>>,
}

impl ScriptedChatModel {
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    /// Queue one more response
    pub async fn push_response(&self, message: Message) {
        self.responses.lock().await.push_back(message);
    }

    /// Responses not yet consumed
    pub async fn remaining(&self) -> usize {
        self.responses.lock().await.len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, _messages: &[Message]) -> Result<Message, BoxError> {
        self.responses
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| "scripted model has no responses left".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_model_plays_in_order() {
        let model = ScriptedChatModel::new(vec![
            Message::assistant("first"),
            Message::assistant("second"),
        ]);

        let history = [Message::user("hi")];
        assert_eq!(model.complete(&history).await.unwrap().content, "first");
        assert_eq!(model.complete(&history).await.unwrap().content, "second");
        assert!(model.complete(&history).await.is_err());
    }
}
