//! Shows where the history was exported and offers to open the folder.

use super::Modal;
use egui::{Align2, Context, Key, RichText, Vec2};
use std::path::PathBuf;

pub struct ExportDialog {
    path: Option<PathBuf>,
}

impl ExportDialog {
    pub fn new() -> Self {
        Self { path: None }
    }

    pub fn open_with_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }
}

impl Default for ExportDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl Modal for ExportDialog {
    fn update(&mut self, ctx: &Context) -> bool {
        let Some(path) = self.path.clone() else {
            return false;
        };

        let mut should_close = false;
        egui::Window::new("💾 Экспорт")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_min_width(380.0);
                ui.label("История сохранена в файл:");
                ui.label(RichText::new(path.display().to_string()).monospace());
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button("Открыть папку").clicked() {
                        if let Some(dir) = path.parent() {
                            if let Err(e) = open::that(dir) {
                                tracing::warn!(dir = %dir.display(), error = %e, "Failed to open export folder");
                            }
                        }
                    }
                    if ui.button("OK").clicked() {
                        should_close = true;
                    }
                });
            });

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            should_close = true;
        }
        if should_close {
            self.path = None;
        }
        should_close
    }

    fn is_open(&self) -> bool {
        self.path.is_some()
    }

    fn close(&mut self) {
        self.path = None;
    }
}
