//! Chat agent with tool execution

mod chat;
mod context;
mod tool_loop;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::ChatAgent;
pub use context::ConversationContext;
pub use tool_loop::{
    LoopOutcome, LoopState, LoopStatus, ModelTurn, ToolLoop, EMPTY_REPLY, EXHAUSTED_REPLY,
};
