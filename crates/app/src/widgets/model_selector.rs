//! Model dropdown with a search field.
//!
//! The popup lists every model whose id contains the search text,
//! ignoring case.

use egui::{ComboBox, TextEdit, Ui};

pub struct ModelSelector {
    models: Vec<String>,
    selected: String,
    search: String,
}

impl ModelSelector {
    /// Preselect `preferred` when it's in the list, else the first model.
    pub fn new(models: Vec<String>, preferred: Option<&str>) -> Self {
        let selected = preferred
            .filter(|p| models.iter().any(|m| m == p))
            .map(str::to_string)
            .or_else(|| models.first().cloned())
            .unwrap_or_default();
        Self {
            models,
            selected,
            search: String::new(),
        }
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    /// Models matching the current search text
    pub fn filtered(&self) -> Vec<&str> {
        let needle = self.search.trim().to_lowercase();
        self.models
            .iter()
            .filter(|m| needle.is_empty() || m.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    /// Render the dropdown. Returns true when the selection changed.
    pub fn show(&mut self, ui: &mut Ui, enabled: bool) -> bool {
        let mut chosen: Option<String> = None;

        ui.add_enabled_ui(enabled, |ui| {
            ComboBox::from_id_source("model_selector")
                .width(320.0)
                .selected_text(self.selected.as_str())
                .show_ui(ui, |ui| {
                    ui.add(
                        TextEdit::singleline(&mut self.search)
                            .hint_text("Поиск модели...")
                            .desired_width(300.0),
                    );
                    ui.separator();

                    let matches = self.filtered();
                    if matches.is_empty() {
                        ui.label(egui::RichText::new("Ничего не найдено").weak());
                    }
                    egui::ScrollArea::vertical()
                        .max_height(300.0)
                        .show(ui, |ui| {
                            for model in matches {
                                if ui
                                    .selectable_label(model == self.selected, model)
                                    .clicked()
                                {
                                    chosen = Some(model.to_string());
                                }
                            }
                        });
                });
        });

        match chosen {
            Some(model) if model != self.selected => {
                tracing::info!(model = %model, "Model selected");
                self.selected = model;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models() -> Vec<String> {
        vec![
            "anthropic/claude-3.5-sonnet".to_string(),
            "google/gemini-flash-1.5".to_string(),
            "openai/gpt-4o".to_string(),
            "openai/gpt-4o-mini".to_string(),
        ]
    }

    #[test]
    fn test_preferred_model_is_selected() {
        let selector = ModelSelector::new(models(), Some("openai/gpt-4o-mini"));
        assert_eq!(selector.selected(), "openai/gpt-4o-mini");
    }

    #[test]
    fn test_unknown_preferred_falls_back_to_first() {
        let selector = ModelSelector::new(models(), Some("nope/model"));
        assert_eq!(selector.selected(), "anthropic/claude-3.5-sonnet");

        let empty = ModelSelector::new(Vec::new(), None);
        assert_eq!(empty.selected(), "");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut selector = ModelSelector::new(models(), None);
        selector.set_search("GPT-4O");
        assert_eq!(selector.filtered(), vec!["openai/gpt-4o", "openai/gpt-4o-mini"]);

        selector.set_search("  ");
        assert_eq!(selector.filtered().len(), 4);

        selector.set_search("mistral");
        assert!(selector.filtered().is_empty());
    }
}
