//! Conversation context management

use crate::llm::{Message, ToolCall};
use crate::storage::ChatEntry;

/// Messages sent to the model for one prompt
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    messages: Vec<Message>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// System instruction, then prior history, then the new prompt
    pub fn build(system_prompt: &str, history: &[ChatEntry], prompt: &str) -> Self {
        let mut context = Self::new();
        context.add_system(system_prompt);
        context
            .messages
            .extend(history.iter().map(ChatEntry::to_message));
        context.add_user(prompt);
        context
    }

    /// Add a system message
    pub fn add_system(&mut self, content: impl Into<String>) {
        self.messages.push(Message::system(content));
    }

    /// Add a user message
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Add an assistant message with tool calls (required before tool results)
    pub fn add_assistant_tool_calls(&mut self, text: Option<String>, tool_calls: &[ToolCall]) {
        self.messages
            .push(Message::assistant_tool_calls(text, tool_calls));
    }

    pub fn add_tool_result(&mut self, tool_call_id: impl Into<String>, result: impl Into<String>) {
        self.messages.push(Message::tool_result(tool_call_id, result));
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
