//! ChannelGrid — card grid of the active category's channels.
//!
//! Loading shows skeleton cards, errors show the stable fetch message with
//! a retry hint, and an empty response gets its own notice.

use std::time::Instant;

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use livetv_proto::channel::Channel;
use livetv_proto::route::Route;

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{
        C_ACCENT, C_ERROR, C_MUTED, C_PANEL_BORDER, C_PRIMARY, C_SECONDARY, C_SKELETON, C_TAG,
    },
    widgets::{
        filter_input::{FilterAction, FilterInput},
        grid_list::GridList,
        pane_chrome::{pane_chrome, Badge},
    },
};

const CARD_WIDTH: u16 = 30;
const CARD_HEIGHT: u16 = 4;
const SKELETON_CARDS: usize = 6;
const EMPTY_MESSAGE: &str = "No channels available for this category.";

/// What one grid cell shows for a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub category: String,
    pub kind: &'static str,
    pub protected: bool,
}

/// One card per record, in response order.
pub fn grid_cards(channels: &[Channel]) -> Vec<Card> {
    channels
        .iter()
        .map(|ch| Card {
            title: ch.channel_name.clone(),
            category: ch.category.clone(),
            kind: ch.stream_kind().label(),
            protected: ch.license().is_some(),
        })
        .collect()
}

pub struct ChannelGrid {
    list: GridList<Channel>,
    filter_input: FilterInput,
    /// Rows that fit the last drawn area.
    visible_rows: usize,
    /// Inner area of the last draw, for mouse hits.
    grid_area: Rect,
    last_click: Option<(usize, Instant)>,
}

impl ChannelGrid {
    pub fn new() -> Self {
        Self {
            list: GridList::new(|ch: &Channel, q: &str| ch.matches(q)),
            filter_input: FilterInput::new("filter channels…"),
            visible_rows: 1,
            grid_area: Rect::default(),
            last_click: None,
        }
    }

    /// Replace the grid's records. Selection restarts at the first card.
    pub fn set_channels(&mut self, channels: &[Channel]) {
        self.list.set_items(channels.to_vec());
        let filter = self.filter_input.text().to_string();
        self.list.set_filter(&filter);
    }

    pub fn clear(&mut self) {
        self.list.set_items(Vec::new());
    }

    pub fn filter_active(&self) -> bool {
        self.filter_input.is_active()
    }

    fn watch_selected(&self) -> Vec<Action> {
        self.list
            .selected_item()
            .map(|ch| vec![Action::Navigate(Route::watch(ch.clone()))])
            .unwrap_or_default()
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Up => {
                self.list.up(1);
                return vec![];
            }
            KeyCode::Down => {
                self.list.down(1);
                return vec![];
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.filter_input.deactivate();
                return vec![Action::CloseFilter, Action::FocusNext];
            }
            _ => {}
        }
        match self.filter_input.handle_key(key) {
            FilterAction::Changed(q) => vec![Action::FilterChanged(q)],
            FilterAction::Confirmed => vec![Action::CloseFilter],
            FilterAction::Cancelled => vec![Action::FilterChanged(String::new()), Action::CloseFilter],
        }
    }

    fn draw_cards(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let columns = (area.width / CARD_WIDTH).max(1) as usize;
        self.list.set_columns(columns);
        self.visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;
        self.list.ensure_visible(self.visible_rows);

        let selected = self.list.selected_position();
        let visible = self.list.visible_items(self.visible_rows);
        let start = visible.first().map(|(pos, _)| *pos).unwrap_or(0);
        for (pos, channel) in visible {
            let Some(cell) = cell_rect(area, pos - start, columns) else {
                continue;
            };
            draw_card(frame, cell, channel, pos == selected, focused);
        }
    }
}

fn cell_rect(area: Rect, offset: usize, columns: usize) -> Option<Rect> {
    let row = (offset / columns) as u16;
    let col = (offset % columns) as u16;
    let y = area.y + row * CARD_HEIGHT;
    if y + CARD_HEIGHT > area.y + area.height {
        return None;
    }
    Some(Rect {
        x: area.x + col * CARD_WIDTH,
        y,
        width: CARD_WIDTH.min(area.width),
        height: CARD_HEIGHT,
    })
}

fn draw_card(frame: &mut Frame, cell: Rect, channel: &Channel, selected: bool, focused: bool) {
    let card = &grid_cards(std::slice::from_ref(channel))[0];
    let border = if selected && focused {
        Style::default().fg(C_ACCENT)
    } else if selected {
        Style::default().fg(C_SECONDARY)
    } else {
        Style::default().fg(C_PANEL_BORDER)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if selected { BorderType::Thick } else { BorderType::Rounded })
        .border_style(border);
    let inner = block.inner(cell);
    frame.render_widget(block, cell);

    let width = inner.width as usize;
    let title_style = if selected {
        Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(C_PRIMARY)
    };
    let mut meta = vec![
        Span::styled("● LIVE ", Style::default().fg(C_ACCENT)),
        Span::styled(card.kind, Style::default().fg(C_TAG)),
    ];
    if card.protected {
        meta.push(Span::styled(" 🔒", Style::default().fg(C_MUTED)));
    }
    let lines = vec![
        Line::from(Span::styled(truncate(&card.title, width), title_style)),
        Line::from(meta),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_skeletons(frame: &mut Frame, area: Rect) {
    let columns = (area.width / CARD_WIDTH).max(1) as usize;
    for i in 0..SKELETON_CARDS {
        let Some(cell) = cell_rect(area, i, columns) else {
            break;
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(C_SKELETON));
        let inner = block.inner(cell);
        frame.render_widget(block, cell);
        let bar = |n: usize| Span::styled("░".repeat(n), Style::default().fg(C_SKELETON));
        let w = inner.width as usize;
        frame.render_widget(
            Paragraph::new(vec![Line::from(bar(w * 3 / 4)), Line::from(bar(w / 3))]),
            inner,
        );
    }
}

fn draw_notice(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), rows[1]);
}

pub(crate) fn truncate(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

impl Component for ChannelGrid {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if self.filter_input.is_active() {
            return self.handle_filter_key(key);
        }

        let rows = if key.modifiers.contains(KeyModifiers::SHIFT) {
            self.visible_rows.max(1)
        } else {
            1
        };
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.list.left(),
            KeyCode::Right | KeyCode::Char('l') => self.list.right(),
            KeyCode::Up | KeyCode::Char('k') => self.list.up(rows),
            KeyCode::Down | KeyCode::Char('j') => self.list.down(rows),
            KeyCode::PageUp => self.list.up(self.visible_rows.max(1)),
            KeyCode::PageDown => self.list.down(self.visible_rows.max(1)),
            KeyCode::Home | KeyCode::Char('g') => self.list.first(),
            KeyCode::End | KeyCode::Char('G') => self.list.last(),
            KeyCode::Enter => return self.watch_selected(),
            KeyCode::Char('/') => {
                self.filter_input.activate();
                return vec![Action::OpenFilter];
            }
            KeyCode::Char('y') => {
                if let Some(ch) = self.list.selected_item() {
                    return vec![Action::CopyToClipboard(ch.url.clone())];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.list.up(1),
            MouseEventKind::ScrollDown => self.list.down(1),
            MouseEventKind::Down(MouseButton::Left) => {
                let a = self.grid_area;
                if event.column < a.x || event.row < a.y {
                    return vec![];
                }
                let col = ((event.column - a.x) / CARD_WIDTH) as usize;
                let row = ((event.row - a.y) / CARD_HEIGHT) as usize;
                if self.list.click(row, col) {
                    let pos = self.list.selected_position();
                    let double = self
                        .last_click
                        .map(|(p, t)| p == pos && t.elapsed().as_millis() < 400)
                        .unwrap_or(false);
                    self.last_click = Some((pos, Instant::now()));
                    if double {
                        self.last_click = None;
                        return self.watch_selected();
                    }
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::FilterChanged(q) => self.list.set_filter(q),
            Action::SelectCategory(_)
            | Action::NextCategory
            | Action::PrevCategory
            | Action::Refresh => {
                self.filter_input.clear();
                self.filter_input.deactivate();
                self.list.set_filter("");
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let count = state
            .channel_list()
            .map(|list| list.len().to_string())
            .unwrap_or_default();
        let badge = (!count.is_empty()).then(|| Badge {
            text: &count,
            color: C_MUTED,
        });
        let title = format!("{} · live channels", state.tabs.active());
        let block = pane_chrome(&title, focused, badge);
        let mut inner = block.inner(area);
        frame.render_widget(block, area);

        if self.filter_input.is_active() || !self.filter_input.is_empty() {
            let bar = Rect { height: 1, ..inner };
            self.filter_input.draw(frame, bar);
            inner.y += 1;
            inner.height = inner.height.saturating_sub(1);
        }
        self.grid_area = inner;

        if state.channels.is_loading() {
            draw_skeletons(frame, inner);
            return;
        }
        if let Some(msg) = state.channels.error_message() {
            draw_notice(
                frame,
                inner,
                vec![
                    Line::from(Span::styled(format!("  {}", msg), Style::default().fg(C_ERROR))),
                    Line::from(Span::styled(
                        "  press R or F5 to retry",
                        Style::default().fg(C_MUTED),
                    )),
                    Line::from(Span::styled(
                        format!("  catalog: {}", state.catalog_url),
                        Style::default().fg(C_MUTED),
                    )),
                ],
            );
            return;
        }
        if self.list.total_len() == 0 {
            if state.channels.data().is_some() {
                draw_notice(
                    frame,
                    inner,
                    vec![Line::from(Span::styled(
                        format!("  {}", EMPTY_MESSAGE),
                        Style::default().fg(C_MUTED),
                    ))],
                );
            }
            return;
        }
        if self.list.is_empty() {
            draw_notice(
                frame,
                inner,
                vec![Line::from(Span::styled(
                    format!("  No channels match \"{}\".", self.list.filter()),
                    Style::default().fg(C_MUTED),
                ))],
            );
            return;
        }
        self.draw_cards(frame, inner, focused);
    }
}
