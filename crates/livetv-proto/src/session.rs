use std::fmt;
use std::sync::Arc;

use tracing::info;

/// Something worth counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEvent {
    PageView { path: String },
    CategorySelected { category: String },
    ChannelOpened { channel: String },
    Shared { url: String },
    PlaybackFailed { channel: String },
}

impl TrackEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PageView { .. } => "page_view",
            Self::CategorySelected { .. } => "category_selected",
            Self::ChannelOpened { .. } => "channel_opened",
            Self::Shared { .. } => "shared",
            Self::PlaybackFailed { .. } => "playback_failed",
        }
    }
}

pub trait EventTracker: Send + Sync {
    fn track(&self, user: Option<&str>, event: &TrackEvent);
}

/// Writes every event to the log under the `analytics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracker;

impl EventTracker for LogTracker {
    fn track(&self, user: Option<&str>, event: &TrackEvent) {
        info!(
            target: "analytics",
            user = user.unwrap_or("anonymous"),
            "{} {:?}",
            event.name(),
            event
        );
    }
}

/// Who is using the app and where their events go.
#[derive(Clone)]
pub struct Session {
    user: Option<String>,
    tracker: Arc<dyn EventTracker>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl Session {
    pub fn new(user: Option<String>, tracker: Arc<dyn EventTracker>) -> Self {
        Self { user, tracker }
    }

    pub fn anonymous() -> Self {
        Self::new(None, Arc::new(LogTracker))
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn track(&self, event: TrackEvent) {
        self.tracker.track(self.user(), &event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(Option<String>, TrackEvent)>>);

    impl EventTracker for Recorder {
        fn track(&self, user: Option<&str>, event: &TrackEvent) {
            self.0
                .lock()
                .unwrap()
                .push((user.map(str::to_string), event.clone()));
        }
    }

    #[test]
    fn events_carry_the_user() {
        let recorder = Arc::new(Recorder::default());
        let session = Session::new(Some("ana".into()), recorder.clone());
        assert!(session.is_signed_in());

        session.track(TrackEvent::ChannelOpened {
            channel: "Ch1".into(),
        });

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0.as_deref(), Some("ana"));
        assert_eq!(events[0].1.name(), "channel_opened");
    }

    #[test]
    fn default_session_is_anonymous() {
        let session = Session::default();
        assert_eq!(session.user(), None);
        session.track(TrackEvent::PageView {
            path: "/live".into(),
        });
    }
}
