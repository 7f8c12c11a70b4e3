pub mod chat_api;
pub mod error;
pub mod events;

pub mod settings {
    use serde::{Deserialize, Serialize};

    fn default_true() -> bool {
        true
    }

    fn default_base_url() -> String {
        "https://openrouter.ai/api/v1".into()
    }

    fn default_request_timeout() -> u64 {
        120
    }

    fn default_threshold() -> f64 {
        10.0
    }

    fn default_poll_interval() -> u64 {
        30 * 60
    }

    /// OpenRouter account and request settings
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct OpenRouterSettings {
        pub api_key: Option<String>,
        #[serde(default = "default_base_url")]
        pub base_url: String,
        /// Model preselected in the dropdown
        pub default_model: Option<String>,
        /// Used when the model list can't be fetched
        #[serde(default)]
        pub fallback_models: Vec<String>,
        /// Upper bound for one chat completion call
        #[serde(default = "default_request_timeout")]
        pub request_timeout_secs: u64,
    }

    /// Telegram bot used for alerts
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TelegramSettings {
        pub bot_token: Option<String>,
        pub chat_id: Option<String>,
        #[serde(default = "default_true")]
        pub enabled: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BalanceSettings {
        /// Alert when the balance drops below this value
        #[serde(default = "default_threshold")]
        pub threshold: f64,
        #[serde(default = "default_poll_interval")]
        pub poll_interval_secs: u64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppSettings {
        #[serde(default)]
        pub openrouter: OpenRouterSettings,
        #[serde(default)]
        pub telegram: TelegramSettings,
        #[serde(default)]
        pub balance: BalanceSettings,
        /// Where chat history exports are written (defaults to `<data dir>/exports`)
        #[serde(default)]
        pub exports_dir: Option<String>,
        #[serde(default = "default_true")]
        pub dark_mode: bool,
    }

    impl Default for OpenRouterSettings {
        fn default() -> Self {
            Self {
                api_key: None,
                base_url: default_base_url(),
                default_model: Some("openai/gpt-4o-mini".into()),
                fallback_models: vec![
                    "openai/gpt-4o-mini".into(),
                    "anthropic/claude-3.5-sonnet".into(),
                    "google/gemini-flash-1.5".into(),
                    "meta-llama/llama-3.1-8b-instruct".into(),
                ],
                request_timeout_secs: default_request_timeout(),
            }
        }
    }

    impl Default for TelegramSettings {
        fn default() -> Self {
            Self {
                bot_token: None,
                chat_id: None,
                enabled: true,
            }
        }
    }

    impl Default for BalanceSettings {
        fn default() -> Self {
            Self {
                threshold: default_threshold(),
                poll_interval_secs: default_poll_interval(),
            }
        }
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                openrouter: OpenRouterSettings::default(),
                telegram: TelegramSettings::default(),
                balance: BalanceSettings::default(),
                exports_dir: None,
                dark_mode: true,
            }
        }
    }

    impl AppSettings {
        /// Apply environment overrides (`.env` is expected to be loaded already).
        pub fn apply_env(&mut self) {
            self.apply_overrides(|key| std::env::var(key).ok());
        }

        pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
            let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

            if let Some(key) = non_empty("OPENROUTER_API_KEY") {
                self.openrouter.api_key = Some(key);
            }
            if let Some(url) = non_empty("OPENROUTER_BASE_URL") {
                self.openrouter.base_url = url.trim_end_matches('/').to_string();
            }
            if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
                self.telegram.bot_token = Some(token);
            }
            if let Some(chat_id) = non_empty("TELEGRAM_CHAT_ID") {
                self.telegram.chat_id = Some(chat_id);
            }
            // NaN would never compare as recovered, so the alert flag could not reset
            if let Some(threshold) = non_empty("CHAT_BALANCE_THRESHOLD")
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|t| t.is_finite())
            {
                self.balance.threshold = threshold;
            }
            if let Some(secs) = non_empty("CHAT_BALANCE_POLL_SECS").and_then(|v| v.parse::<u64>().ok()) {
                // Zero would make the polling loop spin
                self.balance.poll_interval_secs = secs.max(1);
            }
        }

        pub fn poll_interval(&self) -> std::time::Duration {
            std::time::Duration::from_secs(self.balance.poll_interval_secs.max(1))
        }

        pub fn request_timeout(&self) -> std::time::Duration {
            std::time::Duration::from_secs(self.openrouter.request_timeout_secs.max(1))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        #[test]
        fn test_defaults() {
            let settings = AppSettings::default();
            assert_eq!(settings.balance.threshold, 10.0);
            assert_eq!(settings.balance.poll_interval_secs, 1800);
            assert!(settings.telegram.enabled);
        }

        #[test]
        fn test_env_overrides() {
            let vars: HashMap<&str, &str> = [
                ("OPENROUTER_API_KEY", "sk-test"),
                ("OPENROUTER_BASE_URL", "http://localhost:8080/api/"),
                ("TELEGRAM_CHAT_ID", "42"),
                ("TELEGRAM_BOT_TOKEN", "  "),
                ("CHAT_BALANCE_POLL_SECS", "0"),
            ]
            .into_iter()
            .collect();

            let mut settings = AppSettings::default();
            settings.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

            assert_eq!(settings.openrouter.api_key.as_deref(), Some("sk-test"));
            assert_eq!(settings.openrouter.base_url, "http://localhost:8080/api");
            assert_eq!(settings.telegram.chat_id.as_deref(), Some("42"));
            // Blank values are ignored
            assert!(settings.telegram.bot_token.is_none());
            assert_eq!(settings.balance.poll_interval_secs, 1);
        }

        #[test]
        fn test_threshold_override() {
            let mut settings = AppSettings::default();
            settings.apply_overrides(|k| (k == "CHAT_BALANCE_THRESHOLD").then(|| " 2.5 ".to_string()));
            assert_eq!(settings.balance.threshold, 2.5);

            for bad in ["NaN", "inf", "-inf", "ten"] {
                let mut settings = AppSettings::default();
                settings.apply_overrides(|k| (k == "CHAT_BALANCE_THRESHOLD").then(|| bad.to_string()));
                assert_eq!(settings.balance.threshold, 10.0, "accepted {}", bad);
            }
        }

        #[test]
        fn test_partial_json_uses_defaults() {
            let json = r#"{"openrouter": {"api_key": null, "default_model": null}}"#;
            let settings: AppSettings = serde_json::from_str(json).unwrap();
            assert_eq!(settings.openrouter.base_url, "https://openrouter.ai/api/v1");
            assert_eq!(settings.balance.threshold, 10.0);
            assert!(settings.dark_mode);
        }
    }
}
