//! Telegram alerts for the chat client
//!
//! Supports:
//! - Low-balance warnings
//! - Startup notices
//! - Error reports
//!
//! Delivery is best-effort: every send returns `false` instead of failing
//! when the bot isn't configured or Telegram rejects the message.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Serialize;
use shared::events::{NotificationEvent, Notifier};
use shared::settings::TelegramSettings;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);
/// Balances below this are reported as critical
const CRITICAL_BALANCE: f64 = 0.1;
const ERROR_PREVIEW_CHARS: usize = 100;

/// Payload for the Bot API `sendMessage` method
#[derive(Debug, Serialize)]
pub struct TelegramMessage {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: String,
    pub disable_web_page_preview: bool,
}

/// Bot credentials
#[derive(Debug, Clone, Default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// Override for tests or self-hosted Bot API servers
    pub api_base: Option<String>,
}

impl TelegramConfig {
    pub fn from_settings(settings: &TelegramSettings) -> Self {
        Self {
            bot_token: settings.bot_token.clone(),
            chat_id: settings.chat_id.clone(),
            api_base: None,
        }
    }

    /// Both token and chat id are present and non-empty
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.bot_token) && present(&self.chat_id)
    }

    fn send_url(&self, token: &str) -> String {
        let base = self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        format!("{}/bot{}/sendMessage", base.trim_end_matches('/'), token)
    }
}

pub fn format_low_balance(balance: f64, threshold: f64) -> String {
    let status = if balance < CRITICAL_BALANCE {
        "❌ КРИТИЧЕСКИЙ"
    } else {
        "⚠️ НИЗКИЙ"
    };
    format!(
        "⚠️ *Низкий баланс в AIChat приложении*\n\n\
         • *Текущий баланс:* `{:.4}`\n\
         • *Порог уведомления:* `{}`\n\
         • *Статус:* {}\n\n\
         Рекомендуется пополнить баланс на [OpenRouter](https://openrouter.ai/)\n\n\
         _Это автоматическое уведомление_",
        balance, threshold, status
    )
}

pub fn format_startup(version: &str) -> String {
    format!(
        "🚀 *AIChat приложение запущено*\n\n\
         • *Версия:* `{}`\n\
         • *Статус:* ✅ Работает\n\n\
         _Система уведомлений активирована_",
        version
    )
}

pub fn format_error(message: &str) -> String {
    let preview: String = message.chars().take(ERROR_PREVIEW_CHARS).collect();
    format!(
        "❌ *Ошибка в AIChat приложении*\n\n\
         • *Ошибка:* `{}...`\n\
         • *Статус:* ⚠️ Требуется внимание\n\n\
         _Проверьте логи приложения_",
        preview
    )
}

pub struct TelegramNotifier {
    config: TelegramConfig,
    http: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        if config.is_configured() {
            tracing::info!("Telegram notifier initialized");
        } else {
            tracing::warn!(
                "Telegram notifier is not configured, set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID"
            );
        }
        let http = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, http }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub async fn send_low_balance(&self, balance: f64, threshold: f64) -> bool {
        if !self.is_configured() {
            tracing::error!("Cannot send low balance alert: Telegram bot not configured");
            return false;
        }
        if balance > threshold {
            return false;
        }
        self.deliver(format_low_balance(balance, threshold)).await
    }

    pub async fn send_startup(&self, version: &str) -> bool {
        if !self.is_configured() {
            return false;
        }
        self.deliver(format_startup(version)).await
    }

    pub async fn send_error(&self, message: &str) -> bool {
        if !self.is_configured() {
            return false;
        }
        self.deliver(format_error(message)).await
    }

    async fn deliver(&self, text: String) -> bool {
        match self.send_message(text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to send Telegram notification");
                false
            }
        }
    }

    /// Post a Markdown message to the configured chat
    pub async fn send_message(&self, text: String) -> Result<()> {
        let token = self
            .config
            .bot_token
            .as_ref()
            .ok_or_else(|| anyhow!("Telegram bot token not configured"))?;
        let chat_id = self
            .config
            .chat_id
            .clone()
            .ok_or_else(|| anyhow!("Telegram chat id not configured"))?;

        let payload = TelegramMessage {
            chat_id: chat_id.clone(),
            text,
            parse_mode: "Markdown".to_string(),
            disable_web_page_preview: true,
        };

        let response = self
            .http
            .post(self.config.send_url(token))
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::info!(chat_id = %chat_id, "Telegram notification sent");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!("Telegram API error: {} - {}", status, body))
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, event: &NotificationEvent) -> bool {
        match event {
            NotificationEvent::Startup { version } => self.send_startup(version).await,
            NotificationEvent::LowBalance { balance, threshold } => {
                self.send_low_balance(*balance, *threshold).await
            }
            NotificationEvent::Error { message } => self.send_error(message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_configured() {
        let config = TelegramConfig::default();
        assert!(!config.is_configured());

        let config = TelegramConfig {
            bot_token: Some("123:abc".to_string()),
            chat_id: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!config.is_configured());

        let config = TelegramConfig {
            bot_token: Some("123:abc".to_string()),
            chat_id: Some("42".to_string()),
            ..Default::default()
        };
        assert!(config.is_configured());
    }

    #[test]
    fn test_send_url() {
        let config = TelegramConfig {
            api_base: Some("http://localhost:8081/".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.send_url("123:abc"),
            "http://localhost:8081/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_low_balance_status() {
        let low = format_low_balance(3.5, 10.0);
        assert!(low.contains("`3.5000`"));
        assert!(low.contains("`10`"));
        assert!(low.contains("НИЗКИЙ"));

        let critical = format_low_balance(0.05, 10.0);
        assert!(critical.contains("КРИТИЧЕСКИЙ"));
    }

    #[test]
    fn test_error_is_truncated() {
        let long = "x".repeat(250);
        let text = format_error(&long);
        assert!(text.contains(&format!("`{}...`", "x".repeat(100))));
        assert!(!text.contains(&"x".repeat(101)));
    }

    #[test]
    fn test_startup_mentions_version() {
        assert!(format_startup("1.2.3").contains("`1.2.3`"));
    }

    #[tokio::test]
    async fn test_unconfigured_sends_nothing() {
        let notifier = TelegramNotifier::new(TelegramConfig::default());
        assert!(!notifier.send_startup("1.0.0").await);
        assert!(!notifier.send_low_balance(1.0, 10.0).await);
        assert!(
            !notifier
                .notify(&NotificationEvent::error("boom"))
                .await
        );
    }

    #[tokio::test]
    async fn test_balance_above_threshold_is_skipped() {
        // Configured, but pointed at an unroutable base so a send attempt would fail loudly
        let notifier = TelegramNotifier::new(TelegramConfig {
            bot_token: Some("123:abc".to_string()),
            chat_id: Some("42".to_string()),
            api_base: Some("http://127.0.0.1:9".to_string()),
        });
        assert!(!notifier.send_low_balance(12.0, 10.0).await);
    }
}
