//! CategoryTabs — one-row tab strip of server categories.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_ERROR, C_MUTED, C_PRIMARY, C_SECONDARY, C_SELECTION_BG, C_SKELETON},
};

const TAB_GAP: u16 = 1;

pub struct CategoryTabs {
    /// Column span of each drawn tab, for mouse hits.
    hits: Vec<(u16, u16, String)>,
}

impl CategoryTabs {
    pub fn new() -> Self {
        Self { hits: Vec::new() }
    }
}

impl Component for CategoryTabs {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => vec![Action::PrevCategory],
            KeyCode::Right | KeyCode::Char('l') => vec![Action::NextCategory],
            KeyCode::Home | KeyCode::Char('g') => first_or_last(state, true),
            KeyCode::End | KeyCode::Char('G') => first_or_last(state, false),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Enter => {
                vec![Action::FocusPane(ComponentId::ChannelGrid)]
            }
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => self
                .hits
                .iter()
                .find(|(start, end, _)| (*start..*end).contains(&event.column))
                .map(|(_, _, category)| vec![Action::SelectCategory(category.clone())])
                .unwrap_or_default(),
            MouseEventKind::ScrollUp => vec![Action::PrevCategory],
            MouseEventKind::ScrollDown => vec![Action::NextCategory],
            _ => vec![],
        }
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        frame.render_widget(Clear, area);
        self.hits.clear();
        if area.height == 0 {
            return;
        }

        let categories = state.tabs.categories();
        if categories.is_empty() {
            let line = if state.categories.is_loading() {
                Line::from(
                    (0..4)
                        .map(|_| Span::styled(" ░░░░░░░░ ", Style::default().fg(C_SKELETON)))
                        .collect::<Vec<_>>(),
                )
            } else if let Some(msg) = state.categories.error_message() {
                Line::from(vec![
                    Span::styled(format!(" {} ", msg), Style::default().fg(C_ERROR)),
                    Span::styled("press R to retry", Style::default().fg(C_MUTED)),
                ])
            } else {
                // Nothing listed yet: show the active fallback tab alone.
                Line::from(tab_span(state.tabs.active(), true, focused))
            };
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let active = state.tabs.active_index();
        let offset = scroll_offset(categories, active, area.width);
        let mut x = area.x;
        let mut spans = Vec::new();
        if offset > 0 {
            spans.push(Span::styled("‹", Style::default().fg(C_MUTED)));
            x += 1;
        }
        for (i, category) in categories.iter().enumerate().skip(offset) {
            let width = tab_width(category);
            if x + width > area.x + area.width {
                spans.push(Span::styled("›", Style::default().fg(C_MUTED)));
                break;
            }
            self.hits.push((x, x + width, category.clone()));
            spans.push(tab_span(category, Some(i) == active, focused));
            spans.push(Span::raw(" ".repeat(TAB_GAP as usize)));
            x += width + TAB_GAP;
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn first_or_last(state: &AppState, first: bool) -> Vec<Action> {
    let categories = state.tabs.categories();
    let pick = if first {
        categories.first()
    } else {
        categories.last()
    };
    pick.map(|c| vec![Action::SelectCategory(c.clone())])
        .unwrap_or_default()
}

fn tab_width(category: &str) -> u16 {
    category.width() as u16 + 2
}

fn tab_span(category: &str, active: bool, focused: bool) -> Span<'static> {
    let style = match (active, focused) {
        (true, true) => Style::default()
            .fg(C_PRIMARY)
            .bg(C_SELECTION_BG)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        (true, false) => Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        (false, _) => Style::default().fg(C_SECONDARY),
    };
    Span::styled(format!(" {} ", category), style)
}

/// First tab to draw so the active one fits in `width` columns.
fn scroll_offset(categories: &[String], active: Option<usize>, width: u16) -> usize {
    let Some(active) = active else {
        return 0;
    };
    // Reserve room for both overflow markers.
    let budget = width.saturating_sub(2);
    let mut used = 0u16;
    let mut start = active;
    loop {
        used += tab_width(&categories[start]) + TAB_GAP;
        if start == 0 {
            return 0;
        }
        let prev = tab_width(&categories[start - 1]) + TAB_GAP;
        if used + prev > budget {
            return start;
        }
        start -= 1;
    }
}
