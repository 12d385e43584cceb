//! LLM provider client.
//!
//! Groq exposes an OpenAI-compatible chat-completions API; this module
//! speaks that wire format, including tool calling. The API key is passed
//! explicitly at construction time and lives only inside the client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use common::config::LlmSettings;
use common::errors::{AppError, AppResult};

/// One message in the provider wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_with_tool_calls(
        content: Option<String>,
        tool_calls: Vec<WireToolCall>,
    ) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: WireFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    /// JSON-encoded arguments, exactly as sent by the provider.
    pub arguments: String,
}

/// A tool declared to the model (OpenAI function schema).
#[derive(Debug, Clone, Serialize)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDef,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDef {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// A completed model call: either plain content or tool calls (or both).
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: Option<String>,
    pub tool_calls: Vec<WireToolCall>,
}

/// A chat-completion model capable of tool calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[WireMessage],
        tools: &[ToolDef],
    ) -> AppResult<Completion>;
}

/// Groq chat-completions client.
pub struct GroqChatModel {
    client: reqwest::Client,
    api_key: String,
    settings: LlmSettings,
}

impl GroqChatModel {
    pub fn new(api_key: String, settings: LlmSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            settings,
        }
    }
}

#[async_trait]
impl ChatModel for GroqChatModel {
    async fn complete(
        &self,
        messages: &[WireMessage],
        tools: &[ToolDef],
    ) -> AppResult<Completion> {
        let mut body = json!({
            "model": self.settings.model,
            "messages": messages,
            "temperature": self.settings.temperature,
            "max_tokens": self.settings.max_tokens,
        });
        if !tools.is_empty() {
            body["tools"] =
                serde_json::to_value(tools).map_err(|e| AppError::LlmApi(e.to_string()))?;
            body["tool_choice"] = json!("auto");
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.settings.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LlmApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(AppError::RateLimited);
            }
            return Err(AppError::LlmApi(format!("{}: {}", status, text)));
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::LlmApi(e.to_string()))?;

        let choice = payload
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LlmApi("completion contained no choices".into()))?;

        Ok(Completion {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_message_shape() {
        let msg = WireMessage::tool_result("call_1", "[\"orders\"]");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
        assert!(json.get("tool_calls").is_none());
    }

    #[test]
    fn test_completion_response_parses_tool_calls() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "list_tables", "arguments": "{}"}
                    }]
                }
            }]
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let message = &parsed.choices[0].message;
        assert!(message.content.is_none());
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "list_tables");
    }
}
