//! LogPanel — tail of the TUI's own log file.
//!
//! One summary line when collapsed, a scrollable pane when expanded.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Borders, Clear, Paragraph},
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{C_CONNECTING, C_ERROR, C_MUTED, C_SECONDARY},
    widgets::pane_chrome::pane_chrome_borders,
};

pub struct LogPanel {
    pub expanded: bool,
    scroll: usize,
    /// Stick to the newest line until the user scrolls up.
    follow: bool,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            expanded: false,
            scroll: 0,
            follow: true,
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        self.scroll = self.scroll.saturating_add_signed(delta);
        self.follow = false;
    }
}

impl Component for LogPanel {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !self.expanded {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-10),
            KeyCode::PageDown => self.scroll_by(10),
            KeyCode::Home | KeyCode::Char('g') => {
                self.scroll = 0;
                self.follow = false;
            }
            KeyCode::End | KeyCode::Char('G') => self.follow = true,
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if self.expanded {
            match event.kind {
                MouseEventKind::ScrollUp => self.scroll_by(-1),
                MouseEventKind::ScrollDown => self.scroll_by(1),
                _ => {}
            }
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::ToggleLogs = action {
            self.expanded = !self.expanded;
            self.follow = true;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        if area.height == 0 {
            return;
        }
        frame.render_widget(Clear, area);
        let logs = &state.tui_log_lines;

        if !self.expanded || area.height <= 2 {
            let mut spans = vec![Span::styled(" log ", Style::default().fg(C_MUTED))];
            match logs.last() {
                Some(raw) => spans.extend(parse_log_line(raw).spans()),
                None => spans.push(Span::styled("(no log)", Style::default().fg(C_MUTED))),
            }
            frame.render_widget(Paragraph::new(Line::from(spans)), area);
            return;
        }

        let block = pane_chrome_borders("log", focused, None, Borders::TOP);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let height = inner.height as usize;
        let max_scroll = logs.len().saturating_sub(height);
        if self.follow || self.scroll >= max_scroll {
            self.scroll = max_scroll;
            self.follow = true;
        }

        let lines: Vec<Line> = logs
            .iter()
            .skip(self.scroll)
            .take(height)
            .map(|raw| {
                let mut spans = vec![Span::raw("  ")];
                spans.extend(parse_log_line(raw).spans());
                Line::from(spans)
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

// ── Log line parsing ──────────────────────────────────────────────────────────

/// A tracing-subscriber line split into its display parts.
#[derive(Debug, PartialEq, Eq)]
struct LogLine {
    time: Option<String>,
    level: Option<String>,
    message: String,
}

impl LogLine {
    fn level_color(&self) -> Color {
        match self.level.as_deref() {
            Some("ERROR") => C_ERROR,
            Some("WARN") => C_CONNECTING,
            _ => C_SECONDARY,
        }
    }

    fn spans(self) -> Vec<Span<'static>> {
        let color = self.level_color();
        let mut spans = Vec::new();
        if let Some(time) = self.time {
            spans.push(Span::styled(format!("{} ", time), Style::default().fg(C_MUTED)));
        }
        if let Some(level) = self.level {
            spans.push(Span::styled(format!("{:<5} ", level), Style::default().fg(color)));
        }
        spans.push(Span::styled(self.message, Style::default().fg(color)));
        spans
    }
}

fn parse_log_line(raw: &str) -> LogLine {
    let clean = strip_ansi(raw);
    let mut rest = clean.trim();

    let mut time = None;
    if let Some((tok, rem)) = rest.split_once(char::is_whitespace) {
        if let Some(ts) = short_timestamp(tok) {
            time = Some(ts);
            rest = rem.trim_start();
        }
    }

    let mut level = None;
    if let Some((tok, rem)) = rest.split_once(char::is_whitespace) {
        let upper = tok.to_ascii_uppercase();
        if matches!(upper.as_str(), "TRACE" | "DEBUG" | "INFO" | "WARN" | "ERROR") {
            level = Some(upper);
            rest = rem.trim_start();
        }
    }

    // Module target, e.g. "livetv_proto::query: "
    if let Some((target, msg)) = rest.split_once(": ") {
        let looks_like_target = !target.is_empty()
            && target.len() <= 48
            && target
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':'));
        if looks_like_target {
            rest = msg.trim_start();
        }
    }

    LogLine {
        time,
        level,
        message: rest.to_string(),
    }
}

fn short_timestamp(token: &str) -> Option<String> {
    let dt = chrono::DateTime::parse_from_rfc3339(token).ok()?;
    Some(dt.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_escape = false;
    for ch in s.chars() {
        if in_escape {
            if ('@'..='~').contains(&ch) && ch != '[' {
                in_escape = false;
            }
        } else if ch == '\u{1b}' {
            in_escape = true;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_tracing_line() {
        let line = parse_log_line(
            "2026-03-01T10:15:00.123456Z  WARN livetv_proto::catalog: fetch categories failed, retrying",
        );
        assert!(line.time.is_some());
        assert_eq!(line.level.as_deref(), Some("WARN"));
        assert_eq!(line.message, "fetch categories failed, retrying");
    }

    #[test]
    fn colored_output_is_cleaned() {
        let line = parse_log_line("\u{1b}[2m2026-03-01T10:15:00Z\u{1b}[0m \u{1b}[32m INFO\u{1b}[0m hello");
        assert_eq!(line.level.as_deref(), Some("INFO"));
        assert_eq!(line.message, "hello");
    }

    #[test]
    fn free_text_passes_through() {
        let line = parse_log_line("mpv: connected to IPC socket");
        assert_eq!(line.time, None);
        assert_eq!(line.level, None);
        // "mpv" is a valid target shape, so it is dropped.
        assert_eq!(line.message, "connected to IPC socket");
        assert_eq!(parse_log_line("just words").message, "just words");
    }
}
