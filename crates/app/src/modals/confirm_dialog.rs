//! Yes/no confirmation, used before clearing the history.

use super::{overlay, Modal, ModalResult};
use egui::{Align2, Context, Id, Key, Vec2};

pub struct ConfirmDialog {
    is_open: bool,
    title: String,
    message: String,
    result: ModalResult<()>,
    id: Id,
}

impl ConfirmDialog {
    pub fn new(id: impl std::hash::Hash, title: impl Into<String>) -> Self {
        Self {
            is_open: false,
            title: title.into(),
            message: String::new(),
            result: ModalResult::Pending,
            id: Id::new(id),
        }
    }

    pub fn open_with_message(&mut self, message: impl Into<String>) {
        self.is_open = true;
        self.message = message.into();
        self.result = ModalResult::Pending;
    }

    /// Take the decision, leaving the dialog pending again
    pub fn take_result(&mut self) -> ModalResult<()> {
        std::mem::replace(&mut self.result, ModalResult::Pending)
    }

    fn confirm(&mut self) {
        self.result = ModalResult::Confirmed(());
    }
}

impl Modal for ConfirmDialog {
    fn update(&mut self, ctx: &Context) -> bool {
        if !self.is_open {
            return false;
        }

        let mut should_close = false;
        overlay(ctx, self.id);

        egui::Window::new(self.title.as_str())
            .id(self.id.with("window"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_min_width(320.0);
                ui.add_space(8.0);
                ui.label(&self.message);
                ui.add_space(12.0);

                ui.horizontal(|ui| {
                    if ui.button("Отмена").clicked() {
                        self.result = ModalResult::Cancelled;
                        should_close = true;
                    }
                    ui.add_space(8.0);
                    let yes = egui::Button::new("Да").fill(egui::Color32::from_rgb(180, 80, 80));
                    if ui.add(yes).clicked() {
                        self.confirm();
                        should_close = true;
                    }
                });
            });

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.result = ModalResult::Cancelled;
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
        self.result = ModalResult::Cancelled;
    }
}
