//! Chat history persistence
//!
//! History is an ordered, append-only list of `{role, text}` entries. The
//! agent only sees the `HistoryStore` trait; `JsonFileHistory` keeps the list
//! in a JSON file under the per-installation storage directory.

mod json_file;

pub use json_file::JsonFileHistory;

use crate::llm::Message;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Who said it, as shown in the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    You,
    Twin,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::You => "You",
            Speaker::Twin => "Twin",
        }
    }
}

/// One persisted chat line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Speaker,
    pub text: String,
}

impl ChatEntry {
    pub fn you(text: impl Into<String>) -> Self {
        Self {
            role: Speaker::You,
            text: text.into(),
        }
    }

    pub fn twin(text: impl Into<String>) -> Self {
        Self {
            role: Speaker::Twin,
            text: text.into(),
        }
    }

    /// Map onto the chat-completions roles
    pub fn to_message(&self) -> Message {
        match self.role {
            Speaker::You => Message::user(&self.text),
            Speaker::Twin => Message::assistant(&self.text),
        }
    }
}

/// Storage for the conversation history
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Full history in append order; unreadable history is empty history
    async fn load(&self) -> Vec<ChatEntry>;

    /// Append one entry and persist
    async fn append(&self, entry: ChatEntry) -> Result<()>;
}

/// History kept only in memory
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: Mutex<Vec<ChatEntry>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<ChatEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn load(&self) -> Vec<ChatEntry> {
        self.entries.lock().await.clone()
    }

    async fn append(&self, entry: ChatEntry) -> Result<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}
