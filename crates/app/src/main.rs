use anyhow::{Context as _, Result};
use chat_host::{BalanceDisplay, BalanceMonitor, InputState, RequestBridge};
use eframe::egui;
use providers::OpenRouterClient;
use services::analytics::Analytics;
use services::cache::ChatCache;
use services::perf_monitor::PerformanceMonitor;
use services::telegram::{TelegramConfig, TelegramNotifier};
use shared::chat_api::ChatApi;
use shared::events::{NotificationEvent, Notifier, NullNotifier};
use shared::settings::AppSettings;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mod modals;
mod state;
mod types;
mod utils;
mod widgets;

use modals::Modal;
use state::AppState;
use utils::*;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> eframe::Result<()> {
    // A missing .env is normal
    let _ = dotenvy::dotenv();

    let (mut settings, existed) = load_settings_or_default();
    if !existed {
        save_settings(&settings);
    }
    // After saving, so secrets from the environment never land in settings.json
    settings.apply_env();

    let data_dir = data_dir();
    init_tracing(&data_dir);
    tracing::info!(version = APP_VERSION, data_dir = %data_dir.display(), "Starting AIChat");

    let app = match ChatApp::bootstrap(settings, data_dir) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Startup failed");
            eprintln!("AIChat could not start: {:#}", e);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 760.0])
            .with_min_inner_size([640.0, 480.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native("AIChat", options, Box::new(|_cc| Box::new(app)))
}

struct ChatApp {
    state: AppState,
    cancel: CancellationToken,
    runtime: Option<tokio::runtime::Runtime>,
}

impl ChatApp {
    fn bootstrap(settings: AppSettings, data_dir: std::path::PathBuf) -> Result<Self> {
        let cache = Arc::new(ChatCache::open(&data_dir).context("opening chat cache")?);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("starting tokio runtime")?;

        let client = OpenRouterClient::from_settings(&settings.openrouter)
            .context("OPENROUTER_API_KEY is not set")?;

        let notifier: Arc<dyn Notifier> = if settings.telegram.enabled {
            Arc::new(TelegramNotifier::new(TelegramConfig::from_settings(
                &settings.telegram,
            )))
        } else {
            Arc::new(NullNotifier)
        };

        let models = match runtime.block_on(client.list_models()) {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => {
                tracing::warn!("Model list is empty, using fallback models");
                settings.openrouter.fallback_models.clone()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch models, using fallback models");
                settings.openrouter.fallback_models.clone()
            }
        };
        tracing::info!(count = models.len(), "Models loaded");

        let api: Arc<dyn ChatApi> = Arc::new(client);
        let analytics = Arc::new(Analytics::new());

        let mut view = types::ChatView::new();
        match cache.get_chat_history() {
            Ok(records) => {
                tracing::info!(messages = records.len(), "Loaded chat history");
                view.load_history(&records);
            }
            Err(e) => tracing::error!(error = %e, "Failed to load chat history"),
        }

        {
            let notifier = notifier.clone();
            runtime.spawn(async move {
                notifier.notify(&NotificationEvent::startup(APP_VERSION)).await;
            });
        }

        let (display_tx, balance_rx) = channel();
        let monitor = BalanceMonitor::new(api.clone(), notifier.clone(), &settings.balance, display_tx);
        let cancel = CancellationToken::new();
        runtime.spawn(monitor.run(cancel.clone()));

        let bridge = RequestBridge::new(
            runtime.handle().clone(),
            api,
            cache.clone(),
            analytics.clone(),
            notifier.clone(),
            settings.request_timeout(),
        );

        let state = AppState {
            view,
            bridge,
            input_text: String::new(),
            models: widgets::ModelSelector::new(models, settings.openrouter.default_model.as_deref()),
            balance: BalanceDisplay::loading(),
            balance_rx,
            clear_dialog: modals::ConfirmDialog::new("clear_history", "Очистить историю"),
            analytics_dialog: modals::AnalyticsDialog::new(),
            export_dialog: modals::ExportDialog::new(),
            dark_mode: settings.dark_mode,
            exports_dir: exports_dir(&settings, &data_dir),
            cache,
            analytics,
            notifier,
            perf: PerformanceMonitor::new(),
            runtime: runtime.handle().clone(),
        };

        Ok(Self {
            state,
            cancel,
            runtime: Some(runtime),
        })
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let s = &mut self.state;
        s.poll();

        // Keep polling for replies and balance updates without input events
        if s.bridge.is_pending() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(Duration::from_millis(500));
        }

        let dark = s.dark_mode;
        let mut style = (*ctx.style()).clone();
        style.visuals = if dark {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        style.visuals.window_rounding = egui::Rounding::same(12.0);
        style.spacing.item_spacing = egui::vec2(8.0, 8.0);
        ctx.set_style(style);

        let pending = s.bridge.is_pending();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(egui::RichText::new("AIChat").size(22.0));
                ui.add_space(16.0);
                s.models.show(ui, !pending);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("🗑 Очистить").clicked() {
                        s.request_clear();
                    }
                    if ui.button("📊 Аналитика").clicked() {
                        s.open_analytics();
                    }
                    if ui.button("💾 Сохранить").clicked() {
                        s.export_history();
                    }
                    ui.add_space(12.0);
                    widgets::balance_label(ui, &s.balance);
                });
            });
            ui.add_space(8.0);
        });

        egui::TopBottomPanel::bottom("input").show(ctx, |ui| {
            ui.add_space(8.0);
            if let Some(banner) = &s.view.banner {
                egui::Frame::none()
                    .fill(egui::Color32::from_rgb(150, 50, 50))
                    .rounding(egui::Rounding::same(8.0))
                    .inner_margin(egui::Margin::same(8.0))
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                    });
                ui.add_space(6.0);
            }

            ui.horizontal(|ui| {
                let stroke_color = match s.view.input_state {
                    InputState::Failed => egui::Color32::from_rgb(220, 60, 60),
                    InputState::Sending => egui::Color32::from_rgb(120, 120, 140),
                    InputState::Idle => egui::Color32::from_rgb(70, 130, 180),
                };

                let mut submitted = false;
                egui::Frame::none()
                    .stroke(egui::Stroke::new(1.5, stroke_color))
                    .rounding(egui::Rounding::same(8.0))
                    .inner_margin(egui::Margin::same(4.0))
                    .show(ui, |ui| {
                        let response = ui.add_enabled(
                            !pending,
                            egui::TextEdit::singleline(&mut s.input_text)
                                .hint_text("Введите сообщение...")
                                .desired_width(ui.available_width() - 110.0)
                                .font(egui::FontId::new(15.0, egui::FontFamily::Proportional)),
                        );
                        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                            submitted = true;
                        }
                    });

                let send = egui::Button::new("Отправить").fill(egui::Color32::from_rgb(70, 130, 180));
                if ui.add_enabled(!pending, send).clicked() {
                    submitted = true;
                }
                if submitted {
                    s.send_message();
                }
            });
            ui.add_space(8.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for entry in &s.view.transcript {
                        ui.add_space(6.0);
                        widgets::message_bubble(ui, entry, dark);
                    }
                    if s.view.loading {
                        ui.add_space(6.0);
                        widgets::loading_bubble(ui, dark);
                    }
                });
        });

        if s.clear_dialog.update(ctx) && s.clear_dialog.take_result().is_confirmed() {
            s.clear_history();
        }
        s.analytics_dialog.update(ctx);
        s.export_dialog.update(ctx);
    }
}

impl Drop for ChatApp {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(Duration::from_secs(2));
        }
        tracing::info!("AIChat stopped");
    }
}
