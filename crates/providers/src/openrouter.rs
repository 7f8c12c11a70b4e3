use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::chat_api::{ChatApi, ChatMessage, CompletionPayload};
use shared::error::ChatError;
use shared::settings::OpenRouterSettings;
use std::env;
use std::sync::LazyLock;
use std::time::Duration;

// The per-request deadline is applied by the caller; this only bounds connects.
static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(15))
        .pool_max_idle_per_host(2)
        .build()
        .unwrap_or_else(|_| Client::new())
});

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

// ── Response types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CreditsResponse {
    data: CreditsData,
}

#[derive(Debug, Deserialize)]
struct CreditsData {
    #[serde(default)]
    total_credits: f64,
    #[serde(default)]
    total_usage: f64,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

// ── Parsing ──────────────────────────────────────────────────────────

fn parse_balance(body: &str) -> Result<f64, ChatError> {
    let credits: CreditsResponse =
        serde_json::from_str(body).map_err(|e| ChatError::Fetch(format!("bad credits body: {}", e)))?;
    Ok(credits.data.total_credits - credits.data.total_usage)
}

fn parse_models(body: &str) -> Result<Vec<String>, ChatError> {
    let models: ModelsResponse = serde_json::from_str(body)
        .map_err(|e| ChatError::Transport(format!("bad models body: {}", e)))?;
    let mut ids: Vec<String> = models.data.into_iter().map(|m| m.id).collect();
    ids.sort();
    ids.dedup();
    Ok(ids)
}

/// Interpret a completion response body.
///
/// Non-2xx responses still count as an API error when the body carries an
/// `error` field; anything else unusable is a transport failure.
fn parse_completion(status: reqwest::StatusCode, body: &str) -> Result<CompletionPayload, ChatError> {
    match serde_json::from_str::<CompletionPayload>(body) {
        Ok(payload) if status.is_success() || payload.error_message().is_some() => Ok(payload),
        Ok(_) => Err(ChatError::Transport(format!("openrouter error: {}", status))),
        Err(e) if status.is_success() => {
            Err(ChatError::Transport(format!("bad completion body: {}", e)))
        }
        Err(_) => {
            let detail: String = body.chars().take(800).collect();
            if detail.trim().is_empty() {
                Err(ChatError::Transport(format!("openrouter error: {}", status)))
            } else {
                Err(ChatError::Transport(format!("openrouter error: {}\n{}", status, detail)))
            }
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

pub struct OpenRouterClient {
    http: Client,
    auth_token: String,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            http: SHARED_HTTP.clone(),
            auth_token: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &OpenRouterSettings) -> Result<Self, ChatError> {
        let auth_token = match &settings.api_key {
            Some(key) if !key.trim().is_empty() => key.clone(),
            _ => env::var("OPENROUTER_API_KEY")
                .map_err(|_| ChatError::Config("OPENROUTER_API_KEY not set".to_string()))?,
        };
        Ok(Self::new(&auth_token, &settings.base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ids of every model the account can use, sorted.
    pub async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        let url = format!("{}/models", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.auth_token)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ChatError::Transport(format!("openrouter error: {}", resp.status())));
        }
        let body = resp.text().await.map_err(|e| ChatError::Transport(e.to_string()))?;
        parse_models(&body)
    }
}

#[async_trait]
impl ChatApi for OpenRouterClient {
    async fn get_balance(&self) -> Result<f64, ChatError> {
        let url = format!("{}/credits", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.auth_token)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| ChatError::Fetch(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ChatError::Fetch(format!("openrouter error: {}", resp.status())));
        }
        let body = resp.text().await.map_err(|e| ChatError::Fetch(e.to_string()))?;
        parse_balance(&body)
    }

    async fn send_message(&self, text: &str, model: &str) -> Result<CompletionPayload, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = CompletionRequest {
            model,
            messages: vec![ChatMessage::user(text)],
        };
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.auth_token)
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        let status = resp.status();
        tracing::debug!(model, status = %status, "Chat completion returned");
        let body = resp.text().await.map_err(|e| ChatError::Transport(e.to_string()))?;
        parse_completion(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_parse_balance() {
        let body = r#"{"data": {"total_credits": 25.5, "total_usage": 18.25}}"#;
        assert_eq!(parse_balance(body).unwrap(), 7.25);
    }

    #[test]
    fn test_parse_balance_garbage_is_fetch_error() {
        assert!(matches!(parse_balance("<html>"), Err(ChatError::Fetch(_))));
    }

    #[test]
    fn test_parse_models_sorted() {
        let body = r#"{"data": [{"id": "openai/gpt-4o"}, {"id": "anthropic/claude-3.5-sonnet"}, {"id": "openai/gpt-4o"}]}"#;
        assert_eq!(
            parse_models(body).unwrap(),
            vec!["anthropic/claude-3.5-sonnet".to_string(), "openai/gpt-4o".to_string()]
        );
    }

    #[test]
    fn test_error_status_with_error_body_is_payload() {
        let body = r#"{"error": {"message": "Rate limit exceeded", "code": 429}}"#;
        let payload = parse_completion(StatusCode::TOO_MANY_REQUESTS, body).unwrap();
        assert_eq!(payload.error_message().as_deref(), Some("Rate limit exceeded"));
    }

    #[test]
    fn test_error_status_without_body_is_transport() {
        let err = parse_completion(StatusCode::BAD_GATEWAY, "").unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_success_body() {
        let body = r#"{"choices": [{"message": {"content": "hi"}}], "usage": {"total_tokens": 3}}"#;
        let result = parse_completion(StatusCode::OK, body).unwrap().into_result().unwrap();
        assert_eq!(result.text, "hi");
        assert_eq!(result.tokens_used, 3);
    }

    #[test]
    fn test_from_settings_trims_base_url() {
        let settings = OpenRouterSettings {
            api_key: Some("sk-test".into()),
            base_url: "http://localhost:9000/api/v1/".into(),
            ..OpenRouterSettings::default()
        };
        let client = OpenRouterClient::from_settings(&settings).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/api/v1");
    }
}
