//! AppState — shared read-only data passed to all components during render/event.
//!
//! The App event loop is the only writer.

use std::sync::Arc;

use chrono::{DateTime, Local};

use livetv_proto::channel::Channel;
use livetv_proto::detail::DetailResolver;
use livetv_proto::query::QueryState;
use livetv_proto::route::Route;
use livetv_proto::tabs::TabController;

use crate::widgets::status_bar::InputMode;

/// What the external player is doing for the detail page's channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Starting,
    Playing,
    Ended,
    /// Failed to load; never retried automatically.
    Failed(String),
}

impl PlaybackStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Playing => "playing",
            Self::Ended => "ended",
            Self::Failed(_) => "error",
        }
    }
}

pub struct AppState {
    pub route: Route,
    pub tabs: TabController,
    pub categories: QueryState<(), Arc<Vec<String>>>,
    pub channels: QueryState<String, Arc<Vec<Channel>>>,
    /// Wall-clock time the active category's channels were applied.
    pub channels_updated: Option<DateTime<Local>>,
    /// Present while on a watch route.
    pub detail: Option<DetailResolver>,
    pub similar: Vec<Channel>,
    pub playback: PlaybackStatus,
    pub input_mode: InputMode,
    pub user: Option<String>,
    pub catalog_url: String,
    pub tui_log_lines: Vec<String>,
}

impl AppState {
    pub fn new(default_category: &str, user: Option<String>, catalog_url: String) -> Self {
        Self {
            route: Route::Live,
            tabs: TabController::new(default_category),
            categories: QueryState::new(),
            channels: QueryState::new(),
            channels_updated: None,
            detail: None,
            similar: Vec::new(),
            playback: PlaybackStatus::Idle,
            input_mode: InputMode::Normal,
            user,
            catalog_url,
            tui_log_lines: Vec::new(),
        }
    }

    /// Channels for the active category, if loaded.
    pub fn channel_list(&self) -> Option<&[Channel]> {
        self.channels.data().map(|list| list.as_slice())
    }

    /// The resolved channel on the detail page.
    pub fn current_channel(&self) -> Option<&Channel> {
        self.detail.as_ref().and_then(DetailResolver::channel)
    }
}
