use egui::{Color32, CornerRadius, Stroke};

use crate::settings::ThemeChoice;

pub struct AppTheme {
    pub background: Color32,
    pub card_background: Color32,
    pub break_background: Color32,
    pub text: Color32,
    pub secondary_text: Color32,
    pub highlight: Color32,
    pub break_text: Color32,
    pub error_text: Color32,
    pub separator: Color32,
    pub button_background: Color32,
    pub button_foreground: Color32,
    pub button_active_background: Color32,
    pub button_hover_background: Color32,
}

impl AppTheme {
    pub fn for_choice(choice: ThemeChoice) -> Self {
        match choice {
            ThemeChoice::Light => Self::light(),
            ThemeChoice::Dark => Self::dark(),
        }
    }

    // Zinc grays with a purple break card
    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(24, 24, 27),
            card_background: Color32::from_rgb(39, 39, 42),
            break_background: Color32::from_rgb(59, 7, 100),
            text: Color32::from_rgb(244, 244, 245),
            secondary_text: Color32::from_rgb(161, 161, 170),
            highlight: Color32::from_rgb(59, 130, 246),
            break_text: Color32::from_rgb(243, 232, 255),
            error_text: Color32::from_rgb(248, 113, 113),
            separator: Color32::from_rgb(63, 63, 70),
            button_background: Color32::from_rgb(63, 63, 70),
            button_foreground: Color32::from_rgb(244, 244, 245),
            button_active_background: Color32::from_rgb(37, 99, 235),
            button_hover_background: Color32::from_rgb(82, 82, 91),
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(249, 250, 251),
            card_background: Color32::from_rgb(255, 255, 255),
            break_background: Color32::from_rgb(243, 232, 255),
            text: Color32::from_rgb(17, 24, 39),
            secondary_text: Color32::from_rgb(107, 114, 128),
            highlight: Color32::from_rgb(59, 130, 246),
            break_text: Color32::from_rgb(107, 33, 168),
            error_text: Color32::from_rgb(220, 38, 38),
            separator: Color32::from_rgb(229, 231, 235),
            button_background: Color32::from_rgb(243, 244, 246),
            button_foreground: Color32::from_rgb(55, 65, 81),
            button_active_background: Color32::from_rgb(59, 130, 246),
            button_hover_background: Color32::from_rgb(229, 231, 235),
        }
    }

    pub fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        // Panels and windows
        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.card_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.widgets.noninteractive.bg_fill = self.card_background;
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);

        // Buttons and other interactive widgets
        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.weak_bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.weak_bg_fill = self.button_hover_background;
        style.visuals.widgets.active.bg_fill = self.button_active_background;
        style.visuals.widgets.active.weak_bg_fill = self.button_active_background;
        // Selected tabs and text selection use the highlight color
        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);

        // Rounded corners
        style.visuals.window_corner_radius = CornerRadius::same(8);
        style.visuals.menu_corner_radius = CornerRadius::same(6);
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(6);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(6);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(6);

        ctx.set_style(style);
    }
}
