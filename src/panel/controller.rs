//! Panel controller: turns page messages into agent calls

use super::PanelMessage;
use crate::agent::ChatAgent;
use std::sync::Arc;

#[derive(Clone)]
pub struct PanelController {
    agent: Arc<ChatAgent>,
}

impl PanelController {
    pub fn new(agent: Arc<ChatAgent>) -> Self {
        Self { agent }
    }

    /// First message a freshly opened panel receives
    pub async fn on_connect(&self) -> PanelMessage {
        PanelMessage::LoadHistory {
            history: self.agent.history().await,
        }
    }

    /// Handle one inbound message; `None` when there is nothing to send back
    pub async fn handle(&self, message: PanelMessage) -> Option<PanelMessage> {
        match message {
            PanelMessage::UserPrompt { text } => {
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                let reply = self.agent.respond(text).await;
                Some(PanelMessage::GroqResponse { text: reply })
            }
            other => {
                tracing::debug!("Ignoring panel message {:?}", other);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedProvider;
    use crate::llm::LlmResponse;
    use crate::storage::{ChatEntry, MemoryHistory};
    use crate::tools::{ToolRegistry, WorkspaceRoot};

    fn controller(replies: &[&str]) -> PanelController {
        let script = replies
            .iter()
            .map(|r| {
                Ok(LlmResponse::Text {
                    text: r.to_string(),
                    usage: None,
                })
            })
            .collect();
        let agent = ChatAgent::new(
            Arc::new(ScriptedProvider::new(script)),
            ToolRegistry::with_defaults(WorkspaceRoot::new(), 4000),
            Arc::new(MemoryHistory::with_entries(vec![ChatEntry::you("old")])),
        );
        PanelController::new(Arc::new(agent))
    }

    #[tokio::test]
    async fn test_connect_loads_history() {
        let msg = controller(&[]).on_connect().await;
        assert_eq!(
            msg,
            PanelMessage::LoadHistory {
                history: vec![ChatEntry::you("old")]
            }
        );
    }

    #[tokio::test]
    async fn test_prompt_gets_response() {
        let controller = controller(&["answer"]);
        let reply = controller
            .handle(PanelMessage::UserPrompt {
                text: "question".into(),
            })
            .await;
        assert_eq!(
            reply,
            Some(PanelMessage::GroqResponse {
                text: "answer".into()
            })
        );

        match controller.on_connect().await {
            PanelMessage::LoadHistory { history } => assert_eq!(history.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_other_messages_are_ignored() {
        let controller = controller(&[]);
        assert!(controller.handle(PanelMessage::Unknown).await.is_none());
        assert!(controller
            .handle(PanelMessage::UserPrompt { text: "   ".into() })
            .await
            .is_none());
    }
}
