//! Session statistics window.

use super::Modal;
use egui::{Align2, Context, Key, RichText, Vec2};
use services::analytics::{Analytics, UsageStatistics};

pub struct AnalyticsDialog {
    is_open: bool,
    lines: Vec<String>,
}

impl AnalyticsDialog {
    pub fn new() -> Self {
        Self {
            is_open: false,
            lines: Vec::new(),
        }
    }

    /// Open with a snapshot of `stats`; the dialog doesn't refresh while open
    pub fn open_with(&mut self, stats: &UsageStatistics) {
        self.lines = Analytics::format_report(stats);
        self.is_open = true;
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Default for AnalyticsDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl Modal for AnalyticsDialog {
    fn update(&mut self, ctx: &Context) -> bool {
        if !self.is_open {
            return false;
        }

        let mut should_close = false;
        egui::Window::new("📊 Аналитика")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_min_width(340.0);
                ui.add_space(4.0);
                for line in &self.lines {
                    ui.label(RichText::new(line).size(14.0));
                }
                ui.add_space(12.0);
                if ui.button("Закрыть").clicked() {
                    should_close = true;
                }
            });

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            should_close = true;
        }
        if should_close {
            self.is_open = false;
        }
        should_close
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn close(&mut self) {
        self.is_open = false;
    }
}
