//! PlayerPage — detail view for one channel.
//!
//! Renders the resolution state (loading, not found, found), the playback
//! status with an inline notice on failure, and a list of similar channels.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use livetv_proto::channel::Channel;
use livetv_proto::detail::Resolution;
use livetv_proto::route::Route;

use crate::{
    action::Action,
    app_state::{AppState, PlaybackStatus},
    component::Component,
    components::channel_grid::truncate,
    theme::{
        style_default, style_heading, style_muted, style_secondary, style_selected_focused,
        C_ACCENT, C_CONNECTING, C_ERROR, C_LIVE, C_MUTED, C_NOTICE_BG, C_TAG,
    },
    widgets::pane_chrome::{pane_chrome, Badge},
};

const PLAYBACK_NOTICE: &str =
    "There was an issue loading this stream. The source may be temporarily unavailable.";

pub struct PlayerPage {
    selected: usize,
    /// Area of the similar list at the last draw, for mouse hits.
    similar_area: Rect,
}

impl PlayerPage {
    pub fn new() -> Self {
        Self {
            selected: 0,
            similar_area: Rect::default(),
        }
    }

    fn watch_similar(&self, state: &AppState) -> Vec<Action> {
        state
            .similar
            .get(self.selected)
            .map(|ch| vec![Action::Navigate(Route::watch(ch.clone()))])
            .unwrap_or_default()
    }
}

impl Component for PlayerPage {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let not_found = matches!(
            state.detail.as_ref().map(|d| d.resolution()),
            Some(Resolution::NotFound)
        );
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => vec![Action::Back],
            KeyCode::Enter if not_found => vec![Action::Back],
            KeyCode::Enter => self.watch_similar(state),
            KeyCode::Char('s') => vec![Action::Share],
            KeyCode::Char('y') => state
                .current_channel()
                .map(|ch| vec![Action::CopyToClipboard(ch.url.clone())])
                .unwrap_or_default(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                vec![]
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < state.similar.len() {
                    self.selected += 1;
                }
                vec![]
            }
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        let a = self.similar_area;
        match event.kind {
            MouseEventKind::Down(MouseButton::Left)
                if event.row >= a.y
                    && event.row < a.y + a.height
                    && event.column >= a.x
                    && event.column < a.x + a.width =>
            {
                let row = (event.row - a.y) as usize;
                if row < state.similar.len() {
                    self.selected = row;
                    return self.watch_similar(state);
                }
                vec![]
            }
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::Navigate(_) | Action::Back = action {
            self.selected = 0;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let Some(detail) = &state.detail else {
            return;
        };
        let block = pane_chrome(detail.id(), focused, status_badge(&state.playback));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.similar_area = Rect::default();

        match detail.resolution() {
            Resolution::Loading => {
                frame.render_widget(
                    Paragraph::new(vec![
                        Line::from(""),
                        Line::from(Span::styled("  Loading stream…", style_secondary())),
                    ]),
                    inner,
                );
            }
            Resolution::NotFound => draw_not_found(frame, inner),
            Resolution::Found(channel) => {
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                    .split(inner);
                draw_info(frame, cols[0], channel, &state.playback);
                self.draw_similar(frame, cols[1], state);
            }
        }
    }
}

impl PlayerPage {
    fn draw_similar(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(area);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(" Similar channels", style_heading()))),
            rows[0],
        );
        let list_area = rows[1];
        self.similar_area = list_area;

        let detail_loading = state.detail.as_ref().is_some_and(|d| d.working_set().is_none());
        if state.similar.is_empty() {
            let msg = if detail_loading {
                "  loading…"
            } else {
                "  no other channels in this category"
            };
            frame.render_widget(Paragraph::new(Span::styled(msg, style_muted())), list_area);
            return;
        }

        self.selected = self.selected.min(state.similar.len() - 1);
        let width = list_area.width.saturating_sub(4) as usize;
        let lines: Vec<Line> = state
            .similar
            .iter()
            .enumerate()
            .take(list_area.height as usize)
            .map(|(i, ch)| {
                let style = if i == self.selected {
                    style_selected_focused()
                } else {
                    style_default()
                };
                Line::from(vec![
                    Span::styled(" ▸ ", Style::default().fg(C_ACCENT)),
                    Span::styled(truncate(&ch.channel_name, width), style),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), list_area);
    }
}

fn status_badge(status: &PlaybackStatus) -> Option<Badge<'static>> {
    let color = match status {
        PlaybackStatus::Idle => return None,
        PlaybackStatus::Starting => C_CONNECTING,
        PlaybackStatus::Playing => C_LIVE,
        PlaybackStatus::Ended => C_MUTED,
        PlaybackStatus::Failed(_) => C_ERROR,
    };
    Some(Badge {
        text: status.label(),
        color,
    })
}

fn not_found_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled("  Stream not found", style_heading())),
        Line::from(Span::styled(
            "  The requested live stream could not be found",
            style_secondary(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  [ Browse available streams ]",
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  Enter / Esc", style_muted()),
        ]),
    ]
}

fn draw_not_found(frame: &mut Frame, area: Rect) {
    frame.render_widget(Paragraph::new(not_found_lines()), area);
}

fn info_lines(channel: &Channel, playback: &PlaybackStatus) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  ● LIVE  ", Style::default().fg(C_ACCENT)),
            Span::styled(channel.channel_name.clone(), style_heading()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  category  ", style_muted()),
            Span::styled(channel.category.clone(), Style::default().fg(C_TAG)),
        ]),
        Line::from(vec![
            Span::styled("  stream    ", style_muted()),
            Span::styled(channel.stream_kind().label(), style_secondary()),
        ]),
        Line::from(vec![
            Span::styled("  license   ", style_muted()),
            Span::styled(
                if channel.license().is_some() {
                    "key provided"
                } else {
                    "none"
                },
                style_secondary(),
            ),
        ]),
        Line::from(vec![
            Span::styled("  player    ", style_muted()),
            Span::styled(playback.label(), style_secondary()),
        ]),
        Line::from(""),
    ];

    if let PlaybackStatus::Failed(reason) = playback {
        lines.push(Line::from(Span::styled(
            format!("  {}", PLAYBACK_NOTICE),
            Style::default().fg(C_ERROR).bg(C_NOTICE_BG),
        )));
        lines.push(Line::from(Span::styled(format!("  {}", reason), style_muted())));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(vec![
        Span::styled("  [s] ", Style::default().fg(C_ACCENT)),
        Span::styled("Share   ", style_secondary()),
        Span::styled("[y] ", Style::default().fg(C_ACCENT)),
        Span::styled("Copy stream URL   ", style_secondary()),
        Span::styled("[Esc] ", Style::default().fg(C_ACCENT)),
        Span::styled("Back to Live Streams", style_secondary()),
    ]));
    lines
}

fn draw_info(frame: &mut Frame, area: Rect, channel: &Channel, playback: &PlaybackStatus) {
    frame.render_widget(
        Paragraph::new(info_lines(channel, playback)).wrap(Wrap { trim: false }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use livetv_proto::detail::DetailResolver;

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.to_string()))
            .collect()
    }

    fn channel(name: &str) -> Channel {
        Channel {
            channel_name: name.into(),
            logo: String::new(),
            category: "news".into(),
            url: "http://x/a.m3u8".into(),
            license_key: None,
        }
    }

    #[test]
    fn not_found_offers_way_back() {
        let rendered = text(&not_found_lines());
        assert!(rendered.contains("Stream not found"));
        assert!(rendered.contains("Browse available streams"));
    }

    #[test]
    fn failure_notice_is_inline() {
        let ch = channel("A");
        let ok = text(&info_lines(&ch, &PlaybackStatus::Playing));
        assert!(!ok.contains("issue loading"));
        let failed = text(&info_lines(&ch, &PlaybackStatus::Failed("404".into())));
        assert!(failed.contains(PLAYBACK_NOTICE));
    }

    #[test]
    fn enter_on_not_found_goes_back() {
        let mut page = PlayerPage::new();
        let mut state = AppState::new("news", None, String::new());
        let mut detail = DetailResolver::from_navigation("Missing", None);
        detail.apply_working_set(Ok(std::sync::Arc::new(vec![channel("A")])));
        state.detail = Some(detail);
        let actions = page.handle_key(KeyEvent::from(KeyCode::Enter), &state);
        assert!(matches!(actions.as_slice(), [Action::Back]));
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: ratatui::crossterm::event::KeyModifiers::NONE,
        }
    }

    #[test]
    fn clicks_beside_the_similar_list_are_ignored() {
        let mut page = PlayerPage::new();
        page.similar_area = Rect::new(40, 5, 30, 6);
        let mut state = AppState::new("news", None, String::new());
        state.detail = Some(DetailResolver::from_navigation("A", Some(channel("A"))));
        state.similar = vec![channel("B"), channel("C")];

        // Same row as the second entry, but in the info column.
        let area = Rect::new(0, 0, 80, 20);
        assert!(page.handle_mouse(click(10, 6), area, &state).is_empty());

        match page.handle_mouse(click(45, 6), area, &state).as_slice() {
            [Action::Navigate(Route::Watch { id, .. })] => assert_eq!(id, "C"),
            other => panic!("unexpected actions {:?}", other),
        }
    }

    #[test]
    fn enter_watches_selected_similar() {
        let mut page = PlayerPage::new();
        let mut state = AppState::new("news", None, String::new());
        state.detail = Some(DetailResolver::from_navigation("A", Some(channel("A"))));
        state.similar = vec![channel("B"), channel("C")];
        page.handle_key(KeyEvent::from(KeyCode::Down), &state);
        let actions = page.handle_key(KeyEvent::from(KeyCode::Enter), &state);
        match actions.as_slice() {
            [Action::Navigate(Route::Watch { id, .. })] => assert_eq!(id, "C"),
            other => panic!("unexpected actions {:?}", other),
        }
    }
}
