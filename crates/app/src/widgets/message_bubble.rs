//! Chat bubbles for the transcript.

use crate::types::{Role, TranscriptEntry};
use egui::{Color32, Frame, Margin, RichText, Rounding, Ui};

const USER_FILL: Color32 = Color32::from_rgb(70, 130, 180);

fn assistant_fill(dark: bool) -> Color32 {
    if dark {
        Color32::from_rgb(50, 50, 58)
    } else {
        Color32::from_rgb(245, 245, 248)
    }
}

fn assistant_text(dark: bool) -> Color32 {
    if dark {
        Color32::from_rgb(220, 220, 230)
    } else {
        Color32::from_rgb(40, 40, 50)
    }
}

/// User messages sit on the right in blue, replies on the left.
/// Replies carrying an API error are tinted red.
pub fn message_bubble(ui: &mut Ui, entry: &TranscriptEntry, dark: bool) {
    match entry.role {
        Role::User => {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                ui.add_space(8.0);
                Frame::none()
                    .fill(USER_FILL)
                    .rounding(Rounding::same(12.0))
                    .inner_margin(Margin::same(12.0))
                    .show(ui, |ui| {
                        ui.set_max_width(500.0);
                        ui.label(RichText::new(&entry.text).color(Color32::WHITE).size(15.0));
                    });
            });
        }
        Role::Assistant => {
            let is_error = entry
                .text
                .starts_with(&format!("{}:", shared::chat_api::API_ERROR_PREFIX));
            let text_color = if is_error {
                Color32::from_rgb(220, 90, 90)
            } else {
                assistant_text(dark)
            };
            let response = Frame::none()
                .fill(assistant_fill(dark))
                .rounding(Rounding::same(12.0))
                .inner_margin(Margin::same(12.0))
                .show(ui, |ui| {
                    ui.set_max_width(600.0);
                    ui.label(RichText::new(&entry.text).color(text_color).size(15.0));
                })
                .response;

            response.context_menu(|ui| {
                if ui.button("Копировать").clicked() {
                    ui.output_mut(|o| o.copied_text = entry.text.clone());
                    ui.close_menu();
                }
            });
        }
    }
}

/// Animated "typing" placeholder shown while a request is pending
pub fn loading_bubble(ui: &mut Ui, dark: bool) {
    Frame::none()
        .fill(assistant_fill(dark))
        .rounding(Rounding::same(12.0))
        .inner_margin(Margin::same(12.0))
        .show(ui, |ui| {
            let time = ui.input(|i| i.time);
            let dots = match ((time * 2.0) as i32) % 4 {
                0 => "   ",
                1 => ".  ",
                2 => ".. ",
                _ => "...",
            };
            ui.label(
                RichText::new(format!("Думаю{}", dots))
                    .color(if dark {
                        Color32::from_rgb(160, 160, 180)
                    } else {
                        Color32::from_rgb(60, 60, 70)
                    })
                    .italics(),
            );
        });
    ui.ctx().request_repaint();
}
