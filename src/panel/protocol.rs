//! Messages exchanged between the panel page and the controller

use crate::storage::ChatEntry;
use serde::{Deserialize, Serialize};

/// One panel message, tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PanelMessage {
    /// Page → controller: the user sent a prompt
    UserPrompt { text: String },
    /// Controller → page: full history to render
    LoadHistory { history: Vec<ChatEntry> },
    /// Controller → page: the assistant reply
    GroqResponse { text: String },
    /// Anything else the page sends
    #[serde(other)]
    Unknown,
}
