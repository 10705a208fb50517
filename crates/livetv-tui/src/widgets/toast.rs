//! Toast notifications — transient status messages in the top-right corner.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn color(self) -> ratatui::style::Color {
        match self {
            Self::Info => C_TOAST_INFO,
            Self::Success => C_TOAST_SUCCESS,
            Self::Warning => C_TOAST_WARNING,
            Self::Error => C_TOAST_ERROR,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Info => "·",
            Self::Success => "✓",
            Self::Warning => "!",
            Self::Error => "✗",
        }
    }
}

struct Toast {
    title: String,
    description: Option<String>,
    severity: Severity,
    expires: Instant,
}

impl Toast {
    fn text(&self) -> String {
        match &self.description {
            Some(desc) => format!("{}: {}", self.title, desc),
            None => self.title.clone(),
        }
    }
}

/// A persistent spinner toast that animates until resolved.
struct SpinnerToast {
    message: String,
    frame: usize,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct ToastManager {
    toasts: VecDeque<Toast>,
    spinner: Option<SpinnerToast>,
    max_visible: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            spinner: None,
            max_visible: 4,
        }
    }

    pub fn push(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
        severity: Severity,
        duration: Duration,
    ) {
        let title = title.into();
        self.toasts
            .retain(|t| t.title != title || t.description != description);
        self.toasts.push_back(Toast {
            title,
            description,
            severity,
            expires: Instant::now() + duration,
        });
        while self.toasts.len() > self.max_visible * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, None, Severity::Info, Duration::from_secs(3));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, None, Severity::Success, Duration::from_secs(3));
    }

    /// Title plus a longer description, e.g. "Link copied to clipboard".
    pub fn success_with(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(
            title,
            Some(description.into()),
            Severity::Success,
            Duration::from_secs(4),
        );
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(message, None, Severity::Warning, Duration::from_secs(4));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, None, Severity::Error, Duration::from_secs(5));
    }

    pub fn error_with(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(
            title,
            Some(description.into()),
            Severity::Error,
            Duration::from_secs(6),
        );
    }

    /// Start or replace the spinner. It animates on every `tick()` and
    /// stays until resolved or dismissed.
    pub fn spinner(&mut self, message: impl Into<String>) {
        self.spinner = Some(SpinnerToast {
            message: message.into(),
            frame: 0,
        });
    }

    pub fn dismiss_spinner(&mut self) {
        self.spinner = None;
    }

    /// Drop expired toasts and advance the spinner. Call each tick.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| t.expires > now);
        if let Some(ref mut s) = self.spinner {
            s.frame = (s.frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinner.is_none()
    }

    #[cfg(test)]
    pub fn messages(&self) -> Vec<String> {
        self.toasts.iter().map(Toast::text).collect()
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let max_width = (area.width / 2).clamp(30, 72).min(area.width);
        let mut y = area.y + 1;

        if let Some(ref s) = self.spinner {
            let icon = SPINNER_FRAMES[s.frame % SPINNER_FRAMES.len()];
            draw_row(
                frame,
                area,
                y,
                max_width,
                format!(" {} {} ", icon, s.message),
                Style::default().fg(C_TOAST_INFO).add_modifier(Modifier::BOLD),
            );
            y += 1;
        }

        for toast in self.toasts.iter().rev().take(self.max_visible) {
            if y >= area.y + area.height {
                break;
            }
            draw_row(
                frame,
                area,
                y,
                max_width,
                format!(" {} {} ", toast.severity.icon(), toast.text()),
                Style::default()
                    .fg(toast.severity.color())
                    .add_modifier(Modifier::BOLD),
            );
            y += 1;
        }
    }
}

fn draw_row(frame: &mut Frame, area: Rect, y: u16, max_width: u16, text: String, style: Style) {
    if y >= area.y + area.height {
        return;
    }
    let w = (text.chars().count() as u16).min(max_width);
    let x = area.x + area.width.saturating_sub(w + 1);
    let toast_area = Rect {
        x,
        y,
        width: w,
        height: 1,
    };
    frame.render_widget(Clear, toast_area);
    frame.render_widget(Paragraph::new(Line::from(Span::styled(text, style))), toast_area);
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_messages_collapse() {
        let mut toasts = ToastManager::new();
        toasts.info("Refreshing channels");
        toasts.info("Refreshing channels");
        assert_eq!(toasts.messages(), vec!["Refreshing channels".to_string()]);
    }

    #[test]
    fn description_is_joined_to_title() {
        let mut toasts = ToastManager::new();
        toasts.success_with("Link copied to clipboard", "You can now share it with anyone!");
        assert_eq!(
            toasts.messages(),
            vec!["Link copied to clipboard: You can now share it with anyone!".to_string()]
        );
    }

    #[test]
    fn expired_toasts_are_dropped() {
        let mut toasts = ToastManager::new();
        toasts.push("gone", None, Severity::Info, Duration::ZERO);
        toasts.tick();
        assert!(toasts.is_empty());
    }

    #[test]
    fn spinner_survives_ticks_until_dismissed() {
        let mut toasts = ToastManager::new();
        toasts.spinner("Starting playback");
        toasts.tick();
        assert!(!toasts.is_empty());
        toasts.dismiss_spinner();
        assert!(toasts.is_empty());
    }
}
