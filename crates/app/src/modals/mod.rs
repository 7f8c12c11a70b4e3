//! Modal dialogs for the chat window.

pub mod analytics_dialog;
pub mod confirm_dialog;
pub mod export_dialog;

pub use analytics_dialog::AnalyticsDialog;
pub use confirm_dialog::ConfirmDialog;
pub use export_dialog::ExportDialog;

use egui::{Align2, Area, Context, Id, Vec2};

/// Trait for modal dialogs.
pub trait Modal {
    /// Update and render the modal. Returns true if the modal should close.
    fn update(&mut self, ctx: &Context) -> bool;

    /// Returns true if the modal is currently open.
    fn is_open(&self) -> bool;

    /// Close the modal.
    fn close(&mut self);
}

/// Result from a modal dialog.
#[derive(Debug, Clone)]
pub enum ModalResult<T> {
    /// User hasn't made a decision yet
    Pending,
    /// User confirmed/submitted
    Confirmed(T),
    /// User cancelled
    Cancelled,
}

impl<T> ModalResult<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, ModalResult::Pending)
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, ModalResult::Confirmed(_))
    }
}

/// Dim everything behind a modal and swallow clicks on it
fn overlay(ctx: &Context, id: Id) {
    Area::new(id.with("overlay"))
        .anchor(Align2::LEFT_TOP, Vec2::ZERO)
        .show(ctx, |ui| {
            let screen_rect = ctx.screen_rect();
            ui.allocate_response(screen_rect.size(), egui::Sense::click());
            ui.painter()
                .rect_filled(screen_rect, 0.0, egui::Color32::from_black_alpha(160));
        });
}
