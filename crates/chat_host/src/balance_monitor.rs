//! Balance monitoring with low-balance alert suppression.
//!
//! [`BalanceMonitor`] runs as a background task. Each cycle it fetches the
//! account balance, publishes a display projection to the UI through a
//! channel, and raises at most one low-balance alert per continuous run of
//! readings below the threshold. The loop exits when its
//! [`CancellationToken`] is cancelled.

use shared::chat_api::ChatApi;
use shared::events::{NotificationEvent, Notifier};
use shared::settings::BalanceSettings;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Below this the balance is shown as critical
pub const CRITICAL_BELOW: f64 = 5.0;
/// Below this (and at or above [`CRITICAL_BELOW`]) the balance is shown as a warning
pub const WARNING_BELOW: f64 = 10.0;

/// Color tier of the balance label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceTier {
    Critical,
    Warning,
    Healthy,
}

impl BalanceTier {
    pub fn from_balance(balance: f64) -> Self {
        if balance < CRITICAL_BELOW {
            BalanceTier::Critical
        } else if balance < WARNING_BELOW {
            BalanceTier::Warning
        } else {
            BalanceTier::Healthy
        }
    }
}

/// What the UI renders for the balance: a label and its color tier
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceDisplay {
    pub text: String,
    pub tier: BalanceTier,
}

impl BalanceDisplay {
    pub fn loading() -> Self {
        Self {
            text: "Баланс: Загрузка...".to_string(),
            tier: BalanceTier::Warning,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            text: "Баланс: н/д".to_string(),
            tier: BalanceTier::Critical,
        }
    }

    pub fn for_balance(balance: f64) -> Self {
        Self {
            text: format!("Баланс: ${:.2}", balance),
            tier: BalanceTier::from_balance(balance),
        }
    }
}

/// Where the balance stands relative to the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalancePhase {
    Above,
    BelowUnnotified,
    BelowNotified,
}

/// Last observed balance plus the alert suppression flag.
///
/// `notified` is only true while the latest observation is below the
/// threshold; the first observation at or above it clears the flag.
#[derive(Debug, Clone)]
pub struct BalanceState {
    balance: Option<f64>,
    threshold: f64,
    notified: bool,
}

impl BalanceState {
    pub fn new(threshold: f64) -> Self {
        Self {
            balance: None,
            threshold,
            notified: false,
        }
    }

    /// `None` until the first successful fetch
    pub fn balance(&self) -> Option<f64> {
        self.balance
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn notified(&self) -> bool {
        self.notified
    }

    pub fn observe(&mut self, balance: f64) {
        self.balance = Some(balance);
    }

    pub fn phase(&self) -> BalancePhase {
        match self.balance {
            Some(b) if b < self.threshold && self.notified => BalancePhase::BelowNotified,
            Some(b) if b < self.threshold => BalancePhase::BelowUnnotified,
            _ => BalancePhase::Above,
        }
    }

    /// Decide whether the latest observation warrants an alert.
    ///
    /// Returns a `LowBalance` event on the first low reading of an excursion
    /// and marks it notified. A reading at or above the threshold resets the
    /// flag.
    pub fn evaluate(&mut self) -> Option<NotificationEvent> {
        let balance = self.balance?;
        if balance >= self.threshold {
            self.notified = false;
            return None;
        }
        if self.notified {
            return None;
        }
        self.notified = true;
        Some(NotificationEvent::LowBalance {
            balance,
            threshold: self.threshold,
        })
    }
}

pub struct BalanceMonitor {
    api: Arc<dyn ChatApi>,
    notifier: Arc<dyn Notifier>,
    state: BalanceState,
    interval: Duration,
    display_tx: Sender<BalanceDisplay>,
}

impl BalanceMonitor {
    pub fn new(
        api: Arc<dyn ChatApi>,
        notifier: Arc<dyn Notifier>,
        settings: &BalanceSettings,
        display_tx: Sender<BalanceDisplay>,
    ) -> Self {
        Self {
            api,
            notifier,
            state: BalanceState::new(settings.threshold),
            interval: Duration::from_secs(settings.poll_interval_secs.max(1)),
            display_tx,
        }
    }

    pub fn state(&self) -> &BalanceState {
        &self.state
    }

    /// Fetch the balance and publish its display projection.
    ///
    /// On failure the previous balance is kept and `None` is returned. If no
    /// balance was ever observed, the display switches to "unavailable".
    pub async fn poll(&mut self) -> Option<f64> {
        match self.api.get_balance().await {
            Ok(balance) => {
                self.state.observe(balance);
                self.publish(BalanceDisplay::for_balance(balance));
                tracing::debug!(balance, "Balance updated");
                Some(balance)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch balance");
                if self.state.balance().is_none() {
                    self.publish(BalanceDisplay::unavailable());
                }
                None
            }
        }
    }

    pub fn evaluate_notification(&mut self) -> Option<NotificationEvent> {
        self.state.evaluate()
    }

    /// One poll cycle: fetch, evaluate, alert
    pub async fn check(&mut self) {
        if self.poll().await.is_none() {
            return;
        }
        if let Some(event) = self.evaluate_notification() {
            let delivered = self.notifier.notify(&event).await;
            if let NotificationEvent::LowBalance { balance, threshold } = event {
                if delivered {
                    tracing::info!(balance, threshold, "Low balance alert sent");
                } else {
                    tracing::warn!(balance, threshold, "Low balance alert was not delivered");
                }
            }
        }
    }

    /// Run the polling loop until `cancel` fires.
    ///
    /// The first tick is immediate and doubles as the startup balance check.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            threshold = self.state.threshold(),
            "Balance monitor started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Balance monitor stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.check().await;
                }
            }
        }
    }

    fn publish(&self, display: BalanceDisplay) {
        // The UI may already be gone during shutdown
        let _ = self.display_tx.send(display);
    }
}
