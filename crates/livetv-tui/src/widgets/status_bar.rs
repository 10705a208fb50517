//! Status bar — bottom line with mode label and keybindings.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use livetv_proto::route::Route;

use crate::theme::{C_MODE_FILTER, C_MODE_NORMAL, C_MUTED, C_SEPARATOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Filter,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Filter => "FILTER",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Filter => C_MODE_FILTER,
        }
    }
}

pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn keys_for(mode: InputMode, route: &Route) -> &'static str {
    match (mode, route) {
        (InputMode::Filter, _) => {
            " type to filter  ↑↓ move  Enter keep  Esc clear+close  Tab next pane"
        }
        (InputMode::Normal, Route::Live) => {
            " [ ] category  ←→↑↓/hjkl move  Enter watch  Tab pane  / filter  F5/R refresh  K keys  L logs  ? help  q quit"
        }
        (InputMode::Normal, Route::Watch { .. }) => {
            " Esc/b back  s share  y copy stream url  ↑↓ similar  Enter watch similar  F5/R refresh  ? help  q quit"
        }
    }
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, route: &Route) {
    let label = match (mode, route) {
        (InputMode::Filter, _) => mode.label(),
        (InputMode::Normal, Route::Live) => "LIVE",
        (InputMode::Normal, Route::Watch { .. }) => "WATCH",
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default()
                .fg(mode.color())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys_for(mode, route), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_page_advertises_back_and_share() {
        let route = Route::Watch {
            id: "x".into(),
            state: None,
        };
        let keys = keys_for(InputMode::Normal, &route);
        assert!(keys.contains("back"));
        assert!(keys.contains("share"));
        assert!(keys_for(InputMode::Filter, &route).contains("Esc"));
    }
}
