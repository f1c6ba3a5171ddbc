//! Chat agent: history in, reply out

use super::{ConversationContext, LoopOutcome, ToolLoop};
use crate::config::Config;
use crate::llm::LlmProvider;
use crate::storage::{ChatEntry, HistoryStore};
use crate::tools::{ToolRegistry, WorkspaceRoot};
use std::sync::Arc;

/// Answers prompts, calling workspace tools as the model asks
///
/// Cheap to share behind an `Arc`; the LSP server and the panel server each
/// hold one.
pub struct ChatAgent {
    llm: Arc<dyn LlmProvider>,
    tools: ToolRegistry,
    history: Arc<dyn HistoryStore>,
    system_prompt: String,
    max_iterations: usize,
}

impl ChatAgent {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: ToolRegistry,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            llm,
            tools,
            history,
            system_prompt: crate::config::DEFAULT_SYSTEM_PROMPT.to_string(),
            max_iterations: 5,
        }
    }

    /// Agent wired the way the config describes
    pub fn from_config(
        config: &Config,
        llm: Arc<dyn LlmProvider>,
        root: WorkspaceRoot,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let tools = ToolRegistry::with_defaults(root, config.agent.max_tool_output_chars);
        Self::new(llm, tools, history)
            .with_system_prompt(&config.llm.system_prompt)
            .with_max_iterations(config.agent.max_iterations)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn workspace_root(&self) -> &WorkspaceRoot {
        self.tools.workspace_root()
    }

    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }

    /// Stored conversation, oldest first
    pub async fn history(&self) -> Vec<ChatEntry> {
        self.history.load().await
    }

    /// Answer `prompt`, recording both sides in history
    ///
    /// Always produces a reply; failures come back as `Error: ...` text.
    pub async fn respond(&self, prompt: &str) -> String {
        self.answer(prompt).await.reply
    }

    /// Like [`respond`](Self::respond), but keeps how the loop ended
    pub async fn answer(&self, prompt: &str) -> LoopOutcome {
        let prior = self.history.load().await;
        self.record(ChatEntry::you(prompt)).await;

        let mut context = ConversationContext::build(&self.system_prompt, &prior, prompt);
        let outcome = ToolLoop::new(self.llm.as_ref(), &self.tools, self.max_iterations)
            .run(&mut context)
            .await;

        tracing::info!(
            requests = outcome.requests,
            tool_calls = outcome.tool_calls,
            tokens = outcome.usage.total_tokens,
            status = ?outcome.status,
            "Prompt answered"
        );

        self.record(ChatEntry::twin(&outcome.reply)).await;
        outcome
    }

    async fn record(&self, entry: ChatEntry) {
        if let Err(e) = self.history.append(entry).await {
            tracing::error!("Failed to save chat history: {:#}", e);
        }
    }
}
