//! Chat API surface consumed by the core.
//!
//! `CompletionPayload` mirrors the OpenAI-compatible response body closely enough
//! to carry either a completion or an `error` field. The core turns it into a
//! [`ChatResult`] via [`CompletionPayload::into_result`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Prefix for error text shown in place of an assistant reply
pub const API_ERROR_PREFIX: &str = "Ошибка";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "system" | "user" | "assistant"
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<CompletionChoice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<CompletionUsage>,
    /// Either a plain string or `{"message": ..., "code": ...}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionUsage {
    #[serde(default)]
    pub total_tokens: u64,
}

/// Outcome of one chat turn as seen by the transcript
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResult {
    pub text: String,
    pub tokens_used: u64,
}

impl ChatResult {
    /// Synthesized reply for an API error payload
    pub fn api_error(message: &str) -> Self {
        Self {
            text: format!("{}: {}", API_ERROR_PREFIX, message),
            tokens_used: 0,
        }
    }
}

impl CompletionPayload {
    /// Extract the error message, if the payload carries one.
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        if error.is_null() {
            return None;
        }
        let message = match error {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(map) => map
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
            other => other.to_string(),
        };
        Some(message)
    }

    /// `Err(Api)` for an error payload, `Err(Transport)` for a payload with no
    /// choices at all, otherwise the first choice's text and the token count.
    pub fn into_result(self) -> Result<ChatResult, ChatError> {
        if let Some(message) = self.error_message() {
            return Err(ChatError::Api(message));
        }
        let text = self
            .choices
            .and_then(|choices| choices.into_iter().next())
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ChatError::Transport("response has no choices".to_string()))?;
        let tokens_used = self.usage.map(|u| u.total_tokens).unwrap_or(0);
        Ok(ChatResult { text, tokens_used })
    }
}

/// Remote language-model account: balance and chat completions.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Remaining credit in currency units
    async fn get_balance(&self) -> Result<f64, ChatError>;

    /// Blocking from the caller's point of view; resolves once the model has answered.
    async fn send_message(&self, text: &str, model: &str) -> Result<CompletionPayload, ChatError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_extraction() {
        let payload: CompletionPayload = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Привет!"}}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12}
        }))
        .unwrap();

        let result = payload.into_result().unwrap();
        assert_eq!(result.text, "Привет!");
        assert_eq!(result.tokens_used, 12);
    }

    #[test]
    fn test_missing_usage_counts_zero_tokens() {
        let payload: CompletionPayload = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": "ok"}}]
        }))
        .unwrap();
        assert_eq!(payload.into_result().unwrap().tokens_used, 0);
    }

    #[test]
    fn test_string_error() {
        let payload: CompletionPayload =
            serde_json::from_value(serde_json::json!({"error": "rate limited"})).unwrap();
        match payload.into_result() {
            Err(ChatError::Api(msg)) => assert_eq!(msg, "rate limited"),
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn test_object_error() {
        let payload: CompletionPayload = serde_json::from_value(serde_json::json!({
            "error": {"message": "Insufficient credits", "code": 402}
        }))
        .unwrap();
        assert_eq!(payload.error_message().as_deref(), Some("Insufficient credits"));
    }

    #[test]
    fn test_no_choices_is_transport() {
        let payload = CompletionPayload::default();
        assert!(payload.into_result().unwrap_err().is_transport());
    }

    #[test]
    fn test_api_error_result() {
        let result = ChatResult::api_error("rate limited");
        assert_eq!(result.text, "Ошибка: rate limited");
        assert_eq!(result.tokens_used, 0);
    }
}
