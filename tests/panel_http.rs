//! Integration tests for the chat panel HTTP server

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use twin_cli::llm::{LlmProvider, LlmResponse, Message, ToolDefinition};
use twin_cli::panel::PanelController;
use twin_cli::storage::{ChatEntry, MemoryHistory};
use twin_cli::tools::{ToolRegistry, WorkspaceRoot};
use twin_cli::ChatAgent;

/// Echoes the last user message back
struct EchoProvider;

#[async_trait]
impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn chat(
        &self,
        messages: &[Message],
        _tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse> {
        let last = messages
            .last()
            .and_then(|m| m.content.as_text())
            .unwrap_or_default();
        Ok(LlmResponse::Text {
            text: format!("echo: {}", last),
            usage: None,
        })
    }
}

async fn start_panel(history: Vec<ChatEntry>) -> String {
    let agent = ChatAgent::new(
        Arc::new(EchoProvider),
        ToolRegistry::with_defaults(WorkspaceRoot::new(), 4000),
        Arc::new(MemoryHistory::with_entries(history)),
    );
    let controller = PanelController::new(Arc::new(agent));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        twin_cli::transport::serve(listener, controller).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health_and_page() {
    let base = start_panel(vec![]).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let page = client
        .get(format!("{}/", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Twin Chat"));
}

#[tokio::test]
async fn test_history_then_prompt() {
    let base = start_panel(vec![ChatEntry::you("before"), ChatEntry::twin("earlier")]).await;
    let client = reqwest::Client::new();

    let loaded: Value = client
        .get(format!("{}/api/history", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(loaded["type"], "loadHistory");
    assert_eq!(loaded["history"].as_array().unwrap().len(), 2);
    assert_eq!(loaded["history"][1]["role"], "Twin");

    let reply: Value = client
        .post(format!("{}/api/message", base))
        .json(&json!({"type": "userPrompt", "text": "hi there"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply, json!({"type": "groqResponse", "text": "echo: hi there"}));

    let loaded: Value = client
        .get(format!("{}/api/history", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(loaded["history"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_unknown_message_type_gets_no_content() {
    let base = start_panel(vec![]).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/message", base))
        .json(&json!({"type": "somethingElse"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
}
