//! Usage analytics for the current session.
//!
//! Pure in-memory aggregation over tracked exchanges: message counts, token
//! totals, throughput and a per-model breakdown.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// One tracked exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageStat {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    /// Length of the user prompt in characters
    pub message_length: usize,
    pub response_time: Duration,
    pub tokens_used: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub messages: u64,
    pub tokens: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub total_messages: u64,
    pub total_tokens: u64,
    pub tokens_per_message: f64,
    pub messages_per_minute: f64,
    pub avg_response_secs: f64,
    pub by_model: HashMap<String, ModelUsage>,
}

impl UsageStatistics {
    fn add(&mut self, stat: &MessageStat) {
        self.total_messages += 1;
        self.total_tokens += stat.tokens_used;

        let entry = self.by_model.entry(stat.model.clone()).or_default();
        entry.messages += 1;
        entry.tokens += stat.tokens_used;
    }
}

pub struct Analytics {
    history: Mutex<Vec<MessageStat>>,
    session_start: Mutex<Instant>,
}

impl Analytics {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            session_start: Mutex::new(Instant::now()),
        }
    }

    pub fn track_message(
        &self,
        model: &str,
        message_length: usize,
        response_time: Duration,
        tokens_used: u64,
    ) {
        tracing::debug!(
            model,
            message_length,
            response_ms = response_time.as_millis() as u64,
            tokens_used,
            "Tracked message"
        );
        self.history.lock().push(MessageStat {
            timestamp: Utc::now(),
            model: model.to_string(),
            message_length,
            response_time,
            tokens_used,
        });
    }

    pub fn get_statistics(&self) -> UsageStatistics {
        let elapsed = self.session_start.lock().elapsed();
        self.statistics_over(elapsed)
    }

    /// Aggregate everything tracked, treating `elapsed` as the session length
    fn statistics_over(&self, elapsed: Duration) -> UsageStatistics {
        let history = self.history.lock();

        let mut stats = UsageStatistics::default();
        let mut total_response = Duration::ZERO;
        for stat in history.iter() {
            stats.add(stat);
            total_response += stat.response_time;
        }

        if stats.total_messages > 0 {
            let n = stats.total_messages as f64;
            stats.tokens_per_message = stats.total_tokens as f64 / n;
            stats.avg_response_secs = total_response.as_secs_f64() / n;
        }

        let minutes = elapsed.as_secs_f64() / 60.0;
        if minutes > 0.0 {
            stats.messages_per_minute = stats.total_messages as f64 / minutes;
        }

        stats
    }

    /// Forget everything and restart the session clock
    pub fn clear_data(&self) {
        self.history.lock().clear();
        *self.session_start.lock() = Instant::now();
    }

    /// Human-readable summary for the analytics dialog
    pub fn format_report(stats: &UsageStatistics) -> Vec<String> {
        let mut lines = vec![
            format!("Всего сообщений: {}", stats.total_messages),
            format!("Всего токенов: {}", stats.total_tokens),
            format!("Среднее токенов/сообщение: {:.2}", stats.tokens_per_message),
            format!("Сообщений в минуту: {:.2}", stats.messages_per_minute),
        ];
        if stats.total_messages > 0 {
            lines.push(format!("Среднее время ответа: {:.2} с", stats.avg_response_secs));
        }

        let mut models: Vec<_> = stats.by_model.iter().collect();
        models.sort_by(|a, b| b.1.tokens.cmp(&a.1.tokens).then(a.0.cmp(b.0)));
        for (model, usage) in models {
            lines.push(format!("• {}: {} сообщ., {} токенов", model, usage.messages, usage.tokens));
        }
        lines
    }
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}
