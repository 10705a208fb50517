//! Color palette and style constants. Dark background, red "on air" accent.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(14, 14, 20);
pub const C_ACCENT: Color = Color::Rgb(235, 72, 88);
pub const C_LIVE: Color = Color::Rgb(80, 200, 120);
pub const C_CONNECTING: Color = Color::Rgb(255, 184, 80);
pub const C_ERROR: Color = Color::Rgb(255, 80, 80);
pub const C_MUTED: Color = Color::Rgb(78, 78, 96);
pub const C_SEPARATOR: Color = Color::Rgb(36, 36, 50);
pub const C_SECONDARY: Color = Color::Rgb(128, 128, 150);
pub const C_PRIMARY: Color = Color::Rgb(222, 222, 234);
pub const C_SELECTION_BG: Color = Color::Rgb(34, 26, 38);
pub const C_SKELETON: Color = Color::Rgb(34, 34, 46);
pub const C_PANEL_BORDER: Color = Color::Rgb(44, 44, 58);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(200, 90, 120);
pub const C_FILTER_BG: Color = Color::Rgb(22, 20, 30);
pub const C_FILTER_FG: Color = Color::Rgb(255, 200, 80);
pub const C_TAG: Color = Color::Rgb(80, 140, 200);
pub const C_NOTICE_BG: Color = Color::Rgb(48, 20, 24);
pub const C_TOAST_INFO: Color = Color::Rgb(90, 150, 230);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(80, 200, 120);
pub const C_TOAST_WARNING: Color = Color::Rgb(255, 184, 80);
pub const C_TOAST_ERROR: Color = Color::Rgb(235, 72, 88);
pub const C_MODE_NORMAL: Color = Color::Rgb(115, 115, 138);
pub const C_MODE_FILTER: Color = Color::Rgb(255, 200, 80);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

pub fn style_selected_focused() -> Style {
    Style::default()
        .bg(C_SELECTION_BG)
        .fg(C_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}

pub fn style_heading() -> Style {
    Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
}
