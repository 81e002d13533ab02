/// LLM Client — the single point of entry for all calls to the external generation service.
///
/// ARCHITECTURAL RULE: No other module may call the chat-completions API directly.
/// Everything goes through the `Generator` capability, injected via `AppState`,
/// so the tailoring pipeline can be exercised with fakes in tests.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

pub mod prompts;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Generation service is not configured")]
    NotConfigured,

    #[error("Generation call exceeded {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One conversation message following the system prompt.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub role: Role,
    pub content: &'a str,
}

impl<'a> Turn<'a> {
    pub fn user(content: &'a str) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }
}

/// A single completion call: one system message, then the conversation turns.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub turns: &'a [Turn<'a>],
    pub max_tokens: u32,
    pub temperature: f32,
}

/// The generation capability. One method, no shared mutable state.
///
/// Carried in `AppState` as `Arc<dyn Generator>`.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible chat completions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the trimmed text of the first choice, if it has any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completions client. A failed call is returned as-is: there is no retry
/// loop, so service degradation is visible to the caller immediately.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            endpoint: format!("{base_url}/chat/completions"),
        })
    }

    pub fn from_config(config: &Config) -> Result<Option<Self>, LlmError> {
        config
            .openai_api_key
            .as_ref()
            .map(|key| {
                Self::new(
                    key.clone(),
                    config.openai_model.clone(),
                    &config.openai_base_url,
                    config.llm_timeout,
                )
            })
            .transpose()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for OpenAiClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: chat_messages(&request),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }

        let chat: ChatResponse = response.json().await?;

        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat.text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// System message first, then the turns in order.
fn chat_messages<'a>(request: &CompletionRequest<'a>) -> Vec<ChatMessage<'a>> {
    std::iter::once(ChatMessage {
        role: "system",
        content: request.system,
    })
    .chain(request.turns.iter().map(|turn| ChatMessage {
        role: turn.role.as_str(),
        content: turn.content,
    }))
    .collect()
}

/// Pulls `error.message` out of an API error body, falling back to the raw body.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Stand-in used when no API key is configured. Every call fails immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    async fn complete(&self, _request: CompletionRequest<'_>) -> Result<String, LlmError> {
        Err(LlmError::NotConfigured)
    }
}

/// Runs one completion under a hard deadline, whatever the generator's own timeout is.
pub async fn complete_within(
    generator: &dyn Generator,
    request: CompletionRequest<'_>,
    limit: Duration,
) -> Result<String, LlmError> {
    match tokio::time::timeout(limit, generator.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(limit)),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"do_now\": []}\n```";
        assert_eq!(strip_json_fences(input), "{\"do_now\": []}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"do_now\": []}\n```";
        assert_eq!(strip_json_fences(input), "{\"do_now\": []}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"do_now\": []}";
        assert_eq!(strip_json_fences(input), "{\"do_now\": []}");
    }

    #[test]
    fn test_chat_response_text_takes_first_choice() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "  hello  "}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("hello"));
        assert_eq!(response.usage.unwrap().completion_tokens, 3);
    }

    #[test]
    fn test_chat_response_blank_content_is_none() {
        let json = r#"{"choices": [{"message": {"content": "   "}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_api_error_message_prefers_envelope() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#.to_string();
        assert_eq!(api_error_message(body), "Invalid API key");
        assert_eq!(api_error_message("bad gateway".to_string()), "bad gateway");
    }

    #[test]
    fn test_chat_request_puts_system_first() {
        let turns = [
            Turn::user("How do I start?"),
            Turn {
                role: Role::Assistant,
                content: "Pick one goal.",
            },
        ];
        let request = CompletionRequest {
            system: "coach",
            turns: &turns,
            max_tokens: 10,
            temperature: 0.2,
        };
        let body = ChatRequest {
            model: "gpt-4o",
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: chat_messages(&request),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][2]["role"], "assistant");
    }

    #[test]
    fn test_role_deserializes_lowercase() {
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
        assert!(serde_json::from_str::<Role>("\"system\"").is_err());
    }

    #[test]
    fn test_from_config_without_key_is_none() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(OpenAiClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_endpoint_is_built_from_base_url() {
        let client = OpenAiClient::new(
            "sk-test".to_string(),
            "gpt-4o".to_string(),
            "http://localhost:9000/v1",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.endpoint, "http://localhost:9000/v1/chat/completions");
        assert_eq!(client.model(), "gpt-4o");
    }

    #[tokio::test]
    async fn test_disabled_generator_always_fails() {
        let turns = [Turn::user("prompt")];
        let request = CompletionRequest {
            system: "system",
            turns: &turns,
            max_tokens: 10,
            temperature: 0.0,
        };
        let result = DisabledGenerator.complete(request).await;
        assert!(matches!(result, Err(LlmError::NotConfigured)));
    }

    struct StalledGenerator;

    #[async_trait]
    impl Generator for StalledGenerator {
        async fn complete(&self, _request: CompletionRequest<'_>) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_within_times_out() {
        let turns = [Turn::user("prompt")];
        let request = CompletionRequest {
            system: "system",
            turns: &turns,
            max_tokens: 10,
            temperature: 0.0,
        };
        let result = complete_within(&StalledGenerator, request, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(LlmError::Timeout(d)) if d == Duration::from_secs(5)));
    }
}
