//! Bounded tool-calling loop
//!
//! The loop alternates between asking the model and running the tools it
//! asked for, until the model answers in text or the request budget runs out:
//!
//! ```text
//! AwaitingModel --FinalText--> Done
//! AwaitingModel --Error--> Failed
//!       |  ^
//! ToolRequest  \-- results appended --\
//!       v                               |
//! ExecutingTools -----------------------/
//!
//! AwaitingModel --ToolRequest on the last permitted request--> Exhausted
//! ```

use super::ConversationContext;
use crate::llm::{LlmProvider, LlmResponse, TokenUsage, ToolCall};
use crate::tools::ToolRegistry;

/// Reply when the model keeps asking for tools past the request budget
pub const EXHAUSTED_REPLY: &str = "Error: tool-calling limit reached without a final answer.";

/// Reply when the model answers with no text at all
pub const EMPTY_REPLY: &str = "No response from Groq";

/// What one model request produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelTurn {
    /// The model answered; the loop is over
    FinalText(String),
    /// The model wants tools run before it answers
    ToolRequest {
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
    /// The request failed; carries the reply shown to the user
    Error(String),
}

impl ModelTurn {
    pub fn from_result(result: anyhow::Result<LlmResponse>) -> Self {
        match result {
            Ok(LlmResponse::Text { text, .. }) => ModelTurn::FinalText(text),
            Ok(LlmResponse::ToolCalls { calls, .. }) => ModelTurn::ToolRequest { text: None, calls },
            Ok(LlmResponse::Mixed {
                text, tool_calls, ..
            }) => ModelTurn::ToolRequest {
                text,
                calls: tool_calls,
            },
            Err(e) => ModelTurn::Error(format!("Error: {}", e)),
        }
    }
}

/// Loop states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    /// About to send request number `iteration` (1-based)
    AwaitingModel { iteration: usize },
    /// Running the calls from request number `iteration`
    ExecutingTools {
        iteration: usize,
        calls: Vec<ToolCall>,
    },
    Done(String),
    Failed(String),
    Exhausted,
}

/// How a finished loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    /// The model answered in text
    Answered,
    /// A model request failed; the reply describes the error
    Failed,
    /// The request budget ran out while the model still wanted tools
    Exhausted,
}

/// Result of a finished loop
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub reply: String,
    pub status: LoopStatus,
    /// Model requests sent
    pub requests: usize,
    /// Tool calls executed
    pub tool_calls: usize,
    pub usage: TokenUsage,
}

impl LoopOutcome {
    /// True when `reply` is an error report rather than a model answer
    pub fn is_error(&self) -> bool {
        self.status != LoopStatus::Answered
    }
}

/// Drives one prompt through the model and the tools
pub struct ToolLoop<'a> {
    llm: &'a dyn LlmProvider,
    tools: &'a ToolRegistry,
    max_iterations: usize,
}

impl<'a> ToolLoop<'a> {
    pub fn new(llm: &'a dyn LlmProvider, tools: &'a ToolRegistry, max_iterations: usize) -> Self {
        Self {
            llm,
            tools,
            max_iterations: max_iterations.max(1),
        }
    }

    /// Run until the model answers or the budget is spent
    ///
    /// `context` is extended in place with every tool call and result.
    pub async fn run(&self, context: &mut ConversationContext) -> LoopOutcome {
        let definitions = self.tools.definitions();
        let mut state = LoopState::AwaitingModel { iteration: 1 };
        let mut requests = 0;
        let mut tool_calls = 0;
        let mut usage = TokenUsage::default();

        loop {
            state = match state {
                LoopState::AwaitingModel { iteration } => {
                    tracing::debug!(
                        iteration,
                        messages = context.len(),
                        "Requesting model"
                    );
                    let result = self.llm.chat(context.messages(), Some(&definitions)).await;
                    requests += 1;
                    if let Ok(response) = &result {
                        if let Some(u) = response.usage() {
                            usage.input_tokens += u.input_tokens;
                            usage.output_tokens += u.output_tokens;
                            usage.total_tokens += u.total_tokens;
                        }
                    }

                    match ModelTurn::from_result(result) {
                        ModelTurn::FinalText(text) if text.is_empty() => {
                            LoopState::Done(EMPTY_REPLY.to_string())
                        }
                        ModelTurn::FinalText(text) => LoopState::Done(text),
                        ModelTurn::Error(reply) => {
                            tracing::warn!("{}", reply);
                            LoopState::Failed(reply)
                        }
                        ModelTurn::ToolRequest { .. } if iteration >= self.max_iterations => {
                            tracing::warn!(
                                "Model still requesting tools after {} requests",
                                requests
                            );
                            LoopState::Exhausted
                        }
                        ModelTurn::ToolRequest { text, calls } => {
                            context.add_assistant_tool_calls(text, &calls);
                            LoopState::ExecutingTools { iteration, calls }
                        }
                    }
                }
                LoopState::ExecutingTools { iteration, calls } => {
                    for call in &calls {
                        let output = self.tools.dispatch(&call.name, &call.arguments).await;
                        tracing::debug!(
                            tool = %call.name,
                            chars = output.len(),
                            "Tool finished"
                        );
                        context.add_tool_result(&call.id, output);
                        tool_calls += 1;
                    }
                    LoopState::AwaitingModel {
                        iteration: iteration + 1,
                    }
                }
                LoopState::Done(reply) => {
                    return LoopOutcome {
                        reply,
                        status: LoopStatus::Answered,
                        requests,
                        tool_calls,
                        usage,
                    };
                }
                LoopState::Failed(reply) => {
                    return LoopOutcome {
                        reply,
                        status: LoopStatus::Failed,
                        requests,
                        tool_calls,
                        usage,
                    };
                }
                LoopState::Exhausted => {
                    return LoopOutcome {
                        reply: EXHAUSTED_REPLY.to_string(),
                        status: LoopStatus::Exhausted,
                        requests,
                        tool_calls,
                        usage,
                    };
                }
            };
        }
    }
}
