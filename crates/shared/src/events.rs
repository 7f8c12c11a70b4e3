//! Notification events pushed to the external alert channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Best-effort alert. Each variant maps to one formatted text message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationEvent {
    /// Application started
    Startup { version: String },
    /// Balance dropped below the alert threshold
    LowBalance { balance: f64, threshold: f64 },
    /// A user-visible operation failed
    Error { message: String },
}

impl NotificationEvent {
    pub fn startup(version: impl Into<String>) -> Self {
        NotificationEvent::Startup {
            version: version.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        NotificationEvent::Error {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::Startup { .. } => "startup",
            NotificationEvent::LowBalance { .. } => "low_balance",
            NotificationEvent::Error { .. } => "error",
        }
    }
}

/// One-way sink for alerts.
///
/// `false` means "not configured or delivery failed". Implementations never
/// return errors to the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &NotificationEvent) -> bool;
}

/// Sink that drops everything. Used when alerts are disabled in settings.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, event: &NotificationEvent) -> bool {
        tracing::debug!(kind = event.kind(), "Notifications disabled, dropping event");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind() {
        assert_eq!(NotificationEvent::startup("1.0.0").kind(), "startup");
        assert_eq!(
            NotificationEvent::LowBalance {
                balance: 3.0,
                threshold: 10.0
            }
            .kind(),
            "low_balance"
        );
        assert_eq!(NotificationEvent::error("boom").kind(), "error");
    }

    #[tokio::test]
    async fn test_null_notifier_reports_not_delivered() {
        assert!(!NullNotifier.notify(&NotificationEvent::startup("1.0.0")).await);
    }
}
