//! Groq chat-completions provider
//!
//! Groq speaks the OpenAI chat-completions wire format: a message array, an
//! optional `tools` list with `tool_choice: "auto"`, and a response whose
//! `choices[0].message` carries either text or `tool_calls`.
//!
//! SECURITY: The bearer token is only sent to the configured endpoint.

use super::{
    ContentPart, LlmError, LlmProvider, LlmResponse, Message, MessageContent, TokenUsage,
    ToolCall, ToolDefinition,
};
use crate::config::LlmConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Groq (OpenAI-compatible) provider
pub struct GroqProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    /// Name of the variable the key came from, for error messages
    api_key_env: String,
}

impl GroqProvider {
    /// Create a provider with an explicit key (or none)
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }

    /// Create a provider from config, reading the key from the configured variable
    pub fn from_config(config: &LlmConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(
                "{} is not set; chat requests will fail until it is",
                config.api_key_env
            );
        }
        Self::new(&config.endpoint, &config.model, api_key).with_api_key_env(&config.api_key_env)
    }

    pub fn with_api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = name.into();
        self
    }

    /// Get the current model
    pub fn model(&self) -> &str {
        &self.model
    }

    // ========================================================================
    // Message Conversion
    // ========================================================================

    /// Convert internal messages to the wire format
    fn convert_messages(&self, messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|msg| {
                let role = msg.role.as_str().to_string();
                match &msg.content {
                    MessageContent::Text(text) => WireMessage {
                        role,
                        content: Some(text.clone()),
                        tool_calls: None,
                        tool_call_id: msg.tool_call_id.clone(),
                    },
                    MessageContent::Parts(parts) => {
                        let tool_calls: Vec<WireToolCall> = parts
                            .iter()
                            .filter_map(|p| match p {
                                ContentPart::ToolUse {
                                    id,
                                    name,
                                    arguments,
                                } => Some(WireToolCall {
                                    id: id.clone(),
                                    call_type: "function".to_string(),
                                    function: WireFunctionCall {
                                        name: name.clone(),
                                        arguments: arguments.clone(),
                                    },
                                }),
                                ContentPart::Text { .. } => None,
                            })
                            .collect();

                        WireMessage {
                            role,
                            content: msg.content.as_text().map(str::to_string),
                            tool_calls: if tool_calls.is_empty() {
                                None
                            } else {
                                Some(tool_calls)
                            },
                            tool_call_id: msg.tool_call_id.clone(),
                        }
                    }
                }
            })
            .collect()
    }

    /// Convert internal tool definitions to the wire format
    fn convert_tools(&self, tools: &[ToolDefinition]) -> Vec<WireTool> {
        tools
            .iter()
            .map(|t| WireTool {
                tool_type: "function".to_string(),
                function: WireFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn build_request(&self, messages: &[Message], tools: Option<&[ToolDefinition]>) -> ChatRequest {
        let mut request = ChatRequest {
            model: self.model.clone(),
            messages: self.convert_messages(messages),
            tools: None,
            tool_choice: None,
        };

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            request.tools = Some(self.convert_tools(tools));
            request.tool_choice = Some("auto".to_string());
        }

        request
    }

    /// Parse a response body into an LlmResponse
    fn parse_response(&self, response: ChatResponse) -> Result<LlmResponse, LlmError> {
        let usage = response.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response had no choices".to_string()))?;

        let text = choice.message.content;
        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(if tool_calls.is_empty() {
            LlmResponse::Text {
                text: text.unwrap_or_default(),
                usage,
            }
        } else if text.as_deref().map(str::is_empty).unwrap_or(true) {
            LlmResponse::ToolCalls {
                calls: tool_calls,
                usage,
            }
        } else {
            LlmResponse::Mixed {
                text,
                tool_calls,
                usage,
            }
        })
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(LlmError::MissingApiKey(self.api_key_env.clone()).into());
        };

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.map(|t| t.len()).unwrap_or(0),
            "Sending chat request"
        );

        let request = self.build_request(messages, tools);
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from_network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Chat request failed");
            return Err(LlmError::from_http_status(status, error_text).into());
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(self.parse_response(body)?)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> GroqProvider {
        GroqProvider::new("https://api.example.com", "llama-test", Some("key".into()))
    }

    #[test]
    fn test_message_conversion() {
        let call = ToolCall {
            id: "call_1".into(),
            name: "read_file".into(),
            arguments: r#"{"filePath":"a.rs"}"#.into(),
        };
        let messages = vec![
            Message::system("You are helpful"),
            Message::user("Hello"),
            Message::assistant_tool_calls(None, &[call]),
            Message::tool_result("call_1", "fn main() {}"),
        ];

        let converted = provider().convert_messages(&messages);
        assert_eq!(converted.len(), 4);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
        assert_eq!(converted[2].role, "assistant");
        assert!(converted[2].content.is_none());
        let calls = converted[2].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "read_file");
        assert_eq!(calls[0].call_type, "function");
        assert_eq!(converted[3].role, "tool");
        assert_eq!(converted[3].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_request_sets_tool_choice_auto() {
        let tools = vec![ToolDefinition {
            name: "list_files".into(),
            description: "List files".into(),
            parameters: json!({"type": "object", "properties": {}}),
        }];

        let request = provider().build_request(&[Message::user("hi")], Some(&tools));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "llama-test");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "list_files");

        let request = provider().build_request(&[Message::user("hi")], None);
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_parse_text_response() {
        let body: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hi there"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        }))
        .unwrap();

        let response = provider().parse_response(body).unwrap();
        assert_eq!(response.text(), Some("Hi there"));
        assert_eq!(response.usage().unwrap().total_tokens, 5);
    }

    #[test]
    fn test_parse_tool_call_response() {
        let body: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_9",
                    "type": "function",
                    "function": {"name": "list_files", "arguments": "{\"dirPath\":\"src\"}"}
                }]
            }}]
        }))
        .unwrap();

        let response = provider().parse_response(body).unwrap();
        assert!(matches!(response, LlmResponse::ToolCalls { .. }));
        assert_eq!(response.tool_calls()[0].id, "call_9");
        assert_eq!(response.tool_calls()[0].arguments, "{\"dirPath\":\"src\"}");
    }

    #[test]
    fn test_parse_empty_choices_is_invalid() {
        let body: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        let err = provider().parse_response(body).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_sending() {
        let provider =
            GroqProvider::new("http://127.0.0.1:9", "m", None).with_api_key_env("TWIN_TEST_KEY");

        let err = provider.chat(&[Message::user("hi")], None).await.unwrap_err();
        let llm_err = err.downcast_ref::<LlmError>().unwrap();
        assert!(matches!(llm_err, LlmError::MissingApiKey(name) if name == "TWIN_TEST_KEY"));
    }
}
