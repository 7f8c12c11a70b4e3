//! Balance text in the header, colored by tier.

use chat_host::{BalanceDisplay, BalanceTier};
use egui::{Color32, RichText, Ui};

pub fn tier_color(tier: BalanceTier) -> Color32 {
    match tier {
        BalanceTier::Critical => Color32::from_rgb(220, 60, 60),
        BalanceTier::Warning => Color32::from_rgb(230, 150, 40),
        BalanceTier::Healthy => Color32::from_rgb(60, 170, 90),
    }
}

pub fn balance_label(ui: &mut Ui, display: &BalanceDisplay) {
    ui.label(
        RichText::new(&display.text)
            .size(15.0)
            .strong()
            .color(tier_color(display.tier)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_have_distinct_colors() {
        let colors = [
            tier_color(BalanceTier::Critical),
            tier_color(BalanceTier::Warning),
            tier_color(BalanceTier::Healthy),
        ];
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }
}
