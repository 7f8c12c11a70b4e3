//! State management for the chat app
//!
//! `AppState` owns the transcript view, the request bridge and the handles
//! to the collaborators. All methods run on the UI thread.

use crate::modals::{AnalyticsDialog, ConfirmDialog, ExportDialog};
use crate::types::ChatView;
use crate::widgets::ModelSelector;
use chat_host::{BalanceDisplay, BridgeOutcome, ChatSurface, RequestBridge};
use services::analytics::Analytics;
use services::cache::ChatCache;
use services::export::export_history;
use services::perf_monitor::PerformanceMonitor;
use shared::events::{NotificationEvent, Notifier};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;

pub struct AppState {
    pub view: ChatView,
    pub bridge: RequestBridge,
    pub input_text: String,
    pub models: ModelSelector,
    pub balance: BalanceDisplay,
    pub balance_rx: Receiver<BalanceDisplay>,
    pub clear_dialog: ConfirmDialog,
    pub analytics_dialog: AnalyticsDialog,
    pub export_dialog: ExportDialog,
    pub dark_mode: bool,
    pub exports_dir: PathBuf,
    pub cache: Arc<ChatCache>,
    pub analytics: Arc<Analytics>,
    pub notifier: Arc<dyn Notifier>,
    pub perf: PerformanceMonitor,
    pub runtime: Handle,
}

impl AppState {
    /// Submit the input box, clearing it when the send was accepted
    pub fn send_message(&mut self) {
        let text = self.input_text.trim().to_string();
        let model = self.models.selected().to_string();
        if self.bridge.send_message(&text, &model, &mut self.view) {
            self.input_text.clear();
        }
    }

    /// Per-frame housekeeping: apply finished requests, take balance updates,
    /// expire the banner.
    pub fn poll(&mut self) {
        if let Some(outcome) = self.bridge.poll(&mut self.view) {
            if let BridgeOutcome::Completed(result) = &outcome {
                tracing::debug!(tokens = result.tokens_used, "Reply applied to transcript");
            }
            self.perf.log_metrics();
        }

        if let Some(latest) = self.balance_rx.try_iter().last() {
            self.balance = latest;
        }

        self.view.expire_banner(Instant::now());
    }

    pub fn open_analytics(&mut self) {
        self.analytics_dialog.open_with(&self.analytics.get_statistics());
    }

    pub fn request_clear(&mut self) {
        self.clear_dialog
            .open_with_message("Удалить всю историю чата? Это действие нельзя отменить.");
    }

    /// Wipe the cache, the session analytics and the transcript
    pub fn clear_history(&mut self) {
        match self.cache.clear_history() {
            Ok(()) => {
                self.analytics.clear_data();
                self.view.clear();
                tracing::info!("Chat history cleared");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to clear history");
                self.report_error(
                    "Не удалось очистить историю",
                    format!("Clear history error: {}", e),
                );
            }
        }
    }

    pub fn export_history(&mut self) {
        let result = self
            .cache
            .get_chat_history()
            .and_then(|records| export_history(&records, &self.exports_dir));
        match result {
            Ok(path) => self.export_dialog.open_with_path(path),
            Err(e) => {
                tracing::error!(error = %e, "Failed to export history");
                self.report_error(
                    "Не удалось сохранить историю",
                    format!("Export error: {:#}", e),
                );
            }
        }
    }

    /// Banner for the user, alert for the operator
    fn report_error(&mut self, banner: &str, alert: String) {
        self.view.show_banner(banner);
        let notifier = self.notifier.clone();
        self.runtime.spawn(async move {
            notifier.notify(&NotificationEvent::error(alert)).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modals::Modal;
    use async_trait::async_trait;
    use shared::chat_api::{
        ChatApi, CompletionChoice, CompletionMessage, CompletionPayload, CompletionUsage,
    };
    use shared::error::ChatError;
    use std::sync::mpsc::{channel, Sender};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::runtime::Runtime;

    struct EchoApi;

    #[async_trait]
    impl ChatApi for EchoApi {
        async fn get_balance(&self) -> Result<f64, ChatError> {
            Ok(100.0)
        }

        async fn send_message(&self, text: &str, _: &str) -> Result<CompletionPayload, ChatError> {
            Ok(CompletionPayload {
                choices: Some(vec![CompletionChoice {
                    message: CompletionMessage {
                        content: Some(format!("echo: {}", text)),
                    },
                }]),
                usage: Some(CompletionUsage { total_tokens: 4 }),
                error: None,
            })
        }
    }

    struct ChannelNotifier {
        tx: Sender<NotificationEvent>,
    }

    #[async_trait]
    impl Notifier for ChannelNotifier {
        async fn notify(&self, event: &NotificationEvent) -> bool {
            let _ = self.tx.send(event.clone());
            true
        }
    }

    struct Harness {
        _runtime: Runtime,
        state: AppState,
        events: Receiver<NotificationEvent>,
    }

    fn harness(exports_dir: PathBuf) -> Harness {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let cache = Arc::new(ChatCache::in_memory().unwrap());
        let analytics = Arc::new(Analytics::new());
        let (tx, events) = channel();
        let notifier: Arc<dyn Notifier> = Arc::new(ChannelNotifier { tx });
        let (_display_tx, balance_rx) = channel();

        let bridge = RequestBridge::new(
            runtime.handle().clone(),
            Arc::new(EchoApi),
            cache.clone(),
            analytics.clone(),
            notifier.clone(),
            Duration::from_secs(5),
        );
        let state = AppState {
            view: ChatView::new(),
            bridge,
            input_text: String::new(),
            models: ModelSelector::new(vec!["test/model".to_string()], None),
            balance: BalanceDisplay::loading(),
            balance_rx,
            clear_dialog: ConfirmDialog::new("clear_history", "Очистить историю"),
            analytics_dialog: AnalyticsDialog::new(),
            export_dialog: ExportDialog::new(),
            dark_mode: true,
            exports_dir,
            cache,
            analytics,
            notifier,
            perf: PerformanceMonitor::new(),
            runtime: runtime.handle().clone(),
        };

        Harness {
            _runtime: runtime,
            state,
            events,
        }
    }

    #[test]
    fn test_export_failure_shows_banner_and_alerts_once() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not_a_dir");
        std::fs::write(&blocker, "plain file").unwrap();

        let mut h = harness(blocker.join("exports"));
        h.state.export_history();

        let banner = h.state.view.banner.as_ref().expect("banner should be shown");
        assert_eq!(banner.message, "Не удалось сохранить историю");
        assert!(!h.state.export_dialog.is_open());

        match h.events.recv_timeout(Duration::from_secs(2)) {
            Ok(NotificationEvent::Error { message }) => {
                assert!(message.starts_with("Export error:"), "got {:?}", message);
            }
            other => panic!("expected an error alert, got {:?}", other),
        }
        assert!(h.events.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_export_success_opens_dialog() {
        let tmp = TempDir::new().unwrap();
        let mut h = harness(tmp.path().join("exports"));
        h.state.cache.save_message("test/model", "q", "a", 3).unwrap();

        h.state.export_history();

        assert!(h.state.export_dialog.is_open());
        assert!(h.state.view.banner.is_none());
        assert_eq!(std::fs::read_dir(tmp.path().join("exports")).unwrap().count(), 1);
        assert!(h.events.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_clear_history_resets_cache_analytics_and_view() {
        let tmp = TempDir::new().unwrap();
        let mut h = harness(tmp.path().to_path_buf());
        h.state.cache.save_message("test/model", "q", "a", 3).unwrap();
        h.state
            .analytics
            .track_message("test/model", 1, Duration::from_millis(10), 3);
        h.state.view.load_history(&h.state.cache.get_chat_history().unwrap());

        h.state.clear_history();

        assert_eq!(h.state.cache.message_count().unwrap(), 0);
        assert_eq!(h.state.analytics.get_statistics().total_messages, 0);
        assert!(h.state.view.transcript.is_empty());
        assert!(h.state.view.banner.is_none());
    }

    #[test]
    fn test_send_trims_input_and_clears_it() {
        let tmp = TempDir::new().unwrap();
        let mut h = harness(tmp.path().to_path_buf());
        h.state.input_text = "  привет  ".to_string();

        h.state.send_message();

        assert!(h.state.input_text.is_empty());
        assert_eq!(h.state.view.transcript.len(), 1);
        assert_eq!(h.state.view.transcript[0].text, "привет");

        let deadline = Instant::now() + Duration::from_secs(2);
        while h.state.bridge.is_pending() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            h.state.poll();
        }
        assert!(!h.state.bridge.is_pending());
        assert_eq!(h.state.view.transcript.len(), 2);
        assert_eq!(h.state.view.transcript[1].text, "echo: привет");
    }

    #[test]
    fn test_blank_send_keeps_input() {
        let tmp = TempDir::new().unwrap();
        let mut h = harness(tmp.path().to_path_buf());
        h.state.input_text = "   ".to_string();

        h.state.send_message();

        assert_eq!(h.state.input_text, "   ");
        assert!(h.state.view.transcript.is_empty());
        assert!(!h.state.bridge.is_pending());
    }
}
