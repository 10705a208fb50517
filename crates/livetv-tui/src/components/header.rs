//! Header — single top row: app title, page, category summary, user.
//!
//! Not focusable.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use livetv_proto::route::Route;

use crate::{
    app_state::{AppState, PlaybackStatus},
    theme::{C_ACCENT, C_CONNECTING, C_ERROR, C_LIVE, C_MUTED, C_PRIMARY, C_SECONDARY},
};

pub fn draw_header(frame: &mut Frame, area: Rect, state: &AppState) {
    if area.height == 0 {
        return;
    }
    frame.render_widget(Clear, area);

    let mut left = vec![
        Span::styled(" ● ", Style::default().fg(C_ACCENT)),
        Span::styled(
            "livetv",
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  ", Style::default()),
    ];
    match &state.route {
        Route::Live => {
            left.push(Span::styled("Live Streams", Style::default().fg(C_SECONDARY)));
            left.push(Span::styled("  ", Style::default()));
            left.push(Span::styled(category_summary(state), Style::default().fg(C_MUTED)));
            if let Some(updated) = state.channels_updated {
                left.push(Span::styled(
                    format!("  · updated {}", updated.format("%H:%M:%S")),
                    Style::default().fg(C_MUTED),
                ));
            }
        }
        Route::Watch { id, .. } => {
            left.push(Span::styled("Watching ", Style::default().fg(C_SECONDARY)));
            left.push(Span::styled(
                id.clone(),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ));
            left.extend(playback_badge(&state.playback));
        }
    }

    let user = match &state.user {
        Some(name) => format!("{} ", name),
        None => "anonymous ".to_string(),
    };
    let used: usize = left.iter().map(|s| s.content.width()).sum();
    let pad = (area.width as usize).saturating_sub(used + user.width());
    left.push(Span::raw(" ".repeat(pad)));
    left.push(Span::styled(user, Style::default().fg(C_MUTED)));

    frame.render_widget(Paragraph::new(Line::from(left)), area);
}

fn category_summary(state: &AppState) -> String {
    if state.categories.is_loading() {
        return "Loading categories…".to_string();
    }
    if state.categories.is_error() {
        return "Categories unavailable".to_string();
    }
    match state.tabs.categories().len() {
        0 => String::new(),
        1 => "1 category available".to_string(),
        n => format!("{} categories available", n),
    }
}

fn playback_badge(status: &PlaybackStatus) -> Option<Span<'static>> {
    let color = match status {
        PlaybackStatus::Idle => return None,
        PlaybackStatus::Starting => C_CONNECTING,
        PlaybackStatus::Playing => C_LIVE,
        PlaybackStatus::Ended => C_MUTED,
        PlaybackStatus::Failed(_) => C_ERROR,
    };
    Some(Span::styled(
        format!("  [{}]", status.label()),
        Style::default().fg(color),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_categories() {
        let mut state = AppState::new("news", None, String::new());
        state.tabs.set_categories(vec!["news".into(), "sports".into()]);
        assert_eq!(category_summary(&state), "2 categories available");
        state.categories.select(Some(()));
        assert_eq!(category_summary(&state), "Loading categories…");
    }
}
