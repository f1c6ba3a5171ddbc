//! LLM provider implementations

use crate::config::Config;
use std::sync::Arc;

mod error;
mod groq;
mod types;

pub use error::LlmError;
pub use groq::GroqProvider;
pub use types::*;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Send a chat completion request (non-streaming)
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse>;
}

/// Create the provider described by the config
pub fn create_provider(config: &Config) -> Arc<dyn LlmProvider> {
    let provider = GroqProvider::from_config(&config.llm);
    tracing::info!("Using {} model {}", provider.name(), provider.model());
    Arc::new(provider)
}
