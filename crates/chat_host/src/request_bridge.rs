//! Bridges the blocking chat call into a frame-driven UI.
//!
//! [`RequestBridge::send_message`] updates the surface immediately, then runs
//! the API call on the tokio runtime. The UI calls [`RequestBridge::poll`]
//! every frame; the result is applied there, on the UI thread, exactly once.

use services::analytics::Analytics;
use services::cache::ChatCache;
use shared::chat_api::{ChatApi, ChatResult};
use shared::error::ChatError;
use shared::events::{NotificationEvent, Notifier};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

/// Visual state of the input box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Idle,
    Sending,
    Failed,
}

/// What the bridge needs from the UI. All calls happen on the UI thread.
pub trait ChatSurface {
    fn append_user(&mut self, text: &str);
    fn append_assistant(&mut self, text: &str);
    fn show_loading(&mut self);
    fn hide_loading(&mut self);
    fn set_input_state(&mut self, state: InputState);
    /// Transient error banner
    fn show_banner(&mut self, message: &str);
}

/// The one in-flight chat turn
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub user_message: String,
    pub model_id: String,
    pub started_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeOutcome {
    /// A reply to show: either the model's text or a synthesized API error
    Completed(ChatResult),
    /// The call itself failed; nothing was persisted
    Failed(String),
}

/// Collaborators shared with the worker task
#[derive(Clone)]
struct Exchange {
    api: Arc<dyn ChatApi>,
    cache: Arc<ChatCache>,
    analytics: Arc<Analytics>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

pub struct RequestBridge {
    runtime: Handle,
    exchange: Exchange,
    pending: Option<PendingRequest>,
    result_rx: Option<Receiver<BridgeOutcome>>,
}

impl RequestBridge {
    pub fn new(
        runtime: Handle,
        api: Arc<dyn ChatApi>,
        cache: Arc<ChatCache>,
        analytics: Arc<Analytics>,
        notifier: Arc<dyn Notifier>,
        timeout: Duration,
    ) -> Self {
        Self {
            runtime,
            exchange: Exchange {
                api,
                cache,
                analytics,
                notifier,
                timeout,
            },
            pending: None,
            result_rx: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Submit one chat turn.
    ///
    /// Returns `false` without touching anything when `text` is blank or a
    /// request is already in flight.
    pub fn send_message(&mut self, text: &str, model: &str, surface: &mut dyn ChatSurface) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        if self.pending.is_some() {
            tracing::debug!("Send ignored, a request is already pending");
            return false;
        }

        surface.append_user(text);
        surface.show_loading();
        surface.set_input_state(InputState::Sending);

        let request = PendingRequest {
            user_message: text.to_string(),
            model_id: model.to_string(),
            started_at: Instant::now(),
        };

        let (tx, rx) = channel();
        self.result_rx = Some(rx);
        self.pending = Some(request.clone());

        let exchange = self.exchange.clone();
        self.runtime.spawn(async move {
            exchange.run(request, tx).await;
        });
        true
    }

    /// Apply a finished request to the surface. Call once per frame.
    pub fn poll(&mut self, surface: &mut dyn ChatSurface) -> Option<BridgeOutcome> {
        let rx = self.result_rx.as_ref()?;
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                tracing::error!("Request worker exited without a result");
                BridgeOutcome::Failed("request worker stopped unexpectedly".to_string())
            }
        };

        self.result_rx = None;
        self.pending = None;
        surface.hide_loading();

        match &outcome {
            BridgeOutcome::Completed(result) => {
                surface.append_assistant(&result.text);
                surface.set_input_state(InputState::Idle);
            }
            BridgeOutcome::Failed(message) => {
                surface.set_input_state(InputState::Failed);
                surface.show_banner(&format!("Ошибка отправки: {}", message));
            }
        }
        Some(outcome)
    }
}

impl Exchange {
    async fn run(self, request: PendingRequest, tx: Sender<BridgeOutcome>) {
        let (outcome, event) = self.complete(&request).await;
        // Deliver to the UI before the alert, which may be slow
        if tx.send(outcome).is_err() {
            tracing::warn!("UI dropped before the reply arrived");
        }
        if let Some(event) = event {
            if !self.notifier.notify(&event).await {
                tracing::debug!(kind = event.kind(), "Error notification not delivered");
            }
        }
    }

    async fn complete(&self, request: &PendingRequest) -> (BridgeOutcome, Option<NotificationEvent>) {
        let model = request.model_id.as_str();
        let started = Instant::now();

        let call = self.api.send_message(&request.user_message, model);
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(payload)) => payload.into_result(),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ChatError::Timeout(self.timeout)),
        };
        let elapsed = started.elapsed();

        match result {
            Ok(reply) => {
                tracing::info!(
                    model,
                    tokens = reply.tokens_used,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Received reply"
                );
                self.persist(request, &reply);
                self.analytics.track_message(
                    model,
                    request.user_message.chars().count(),
                    elapsed,
                    reply.tokens_used,
                );
                (BridgeOutcome::Completed(reply), None)
            }
            Err(ChatError::Api(message)) => {
                tracing::warn!(model, error = %message, "API returned an error");
                let reply = ChatResult::api_error(&message);
                self.persist(request, &reply);
                self.analytics.track_message(
                    model,
                    request.user_message.chars().count(),
                    elapsed,
                    0,
                );
                let event = NotificationEvent::error(format!("API Error: {}", message));
                (BridgeOutcome::Completed(reply), Some(event))
            }
            Err(e) => {
                if e.is_transport() {
                    tracing::error!(model, error = %e, "Send message failed");
                } else {
                    tracing::error!(model, error = %e, "Chat client rejected the request");
                }
                let event = NotificationEvent::error(format!("Send message error: {}", e));
                (BridgeOutcome::Failed(e.to_string()), Some(event))
            }
        }
    }

    fn persist(&self, request: &PendingRequest, reply: &ChatResult) {
        if let Err(e) = self.cache.save_message(
            &request.model_id,
            &request.user_message,
            &reply.text,
            reply.tokens_used,
        ) {
            tracing::error!(error = %e, "Failed to save message to cache");
        }
    }
}
