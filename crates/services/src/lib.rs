//! Collaborators around the chat core: history cache, analytics,
//! Telegram alerts, history export and process metrics.

pub mod analytics;
pub mod cache;
pub mod export;
pub mod perf_monitor;
pub mod telegram;
