//! Playback task — owns the mpv process and turns its events into
//! per-channel outcomes for the detail page.
//!
//! mpv is spawned lazily on the first `Play` and kept idle between
//! channels. A failed load is reported once and never retried.

use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use livetv_proto::config::PlayerConfig;
use livetv_proto::platform;

use crate::mpv::{MpvDriver, MpvEvent, MpvHandle};

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("mpv not found; install it or set player.mpv_path")]
    BinaryNotFound,
    #[error("could not start mpv: {0}")]
    Spawn(String),
    #[error("mpv is not responding: {0}")]
    Ipc(String),
    #[error("could not load stream: {0}")]
    Load(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Loaded,
    Failed(String),
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEvent {
    /// Channel name the outcome belongs to.
    pub channel: String,
    pub outcome: PlaybackOutcome,
}

#[derive(Debug, Clone)]
pub enum PlayerCommand {
    Play {
        channel: String,
        url: String,
        license: Option<String>,
    },
    Stop,
    Shutdown,
}

/// Map an mpv event to a playback outcome. Stops and replacements are
/// not outcomes: the caller asked for them.
pub fn classify(event: &MpvEvent) -> Option<PlaybackOutcome> {
    match event.event_name()? {
        "file-loaded" => Some(PlaybackOutcome::Loaded),
        "end-file" => match event.end_reason()? {
            "error" => Some(PlaybackOutcome::Failed(
                event.file_error().unwrap_or("unknown error").to_string(),
            )),
            "eof" => Some(PlaybackOutcome::Ended),
            _ => None,
        },
        _ => None,
    }
}

/// Cloneable sender side of the playback task.
#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::Sender<PlayerCommand>,
}

impl PlayerHandle {
    pub fn play(&self, channel: &str, url: &str, license: Option<&str>) {
        self.send(PlayerCommand::Play {
            channel: channel.to_string(),
            url: url.to_string(),
            license: license.map(str::to_string),
        });
    }

    pub fn stop(&self) {
        self.send(PlayerCommand::Stop);
    }

    pub fn shutdown(&self) {
        self.send(PlayerCommand::Shutdown);
    }

    fn send(&self, cmd: PlayerCommand) {
        if let Err(e) = self.tx.try_send(cmd) {
            warn!("player: command dropped: {}", e);
        }
    }
}

/// Spawn the playback task. Outcomes go to `event_tx`.
pub fn spawn_player(config: PlayerConfig, event_tx: mpsc::Sender<PlayerEvent>) -> PlayerHandle {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(run_player(config, rx, event_tx));
    PlayerHandle { tx }
}

struct Player {
    config: PlayerConfig,
    binary: Option<PathBuf>,
    driver: MpvDriver,
    handle: Option<MpvHandle>,
    mpv_events: mpsc::Sender<MpvEvent>,
    /// Channel currently loaded, used to attribute mpv events.
    current: Option<String>,
}

impl Player {
    async fn ensure_running(&mut self) -> Result<MpvHandle, PlayerError> {
        if let Some(handle) = &self.handle {
            if self.driver.process_alive() {
                return Ok(handle.clone());
            }
            self.handle = None;
        }
        let binary = self.binary.clone().ok_or(PlayerError::BinaryNotFound)?;
        let handle = self
            .driver
            .spawn_and_connect(
                &binary,
                self.config.volume,
                &self.config.extra_args,
                self.mpv_events.clone(),
            )
            .await
            .map_err(|e| match e.downcast_ref::<std::io::Error>() {
                Some(io) => PlayerError::Spawn(io.to_string()),
                None => PlayerError::Ipc(e.to_string()),
            })?;
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    async fn play(&mut self, url: &str, license: Option<&str>, title: &str) -> Result<(), PlayerError> {
        let handle = self.ensure_running().await?;
        handle
            .load(url, title, license)
            .await
            .map_err(|e| PlayerError::Load(e.to_string()))
    }

    async fn stop(&mut self) {
        self.current = None;
        if let Some(handle) = &self.handle {
            if let Err(e) = handle.stop().await {
                debug!("player: stop failed: {}", e);
            }
        }
    }
}

async fn run_player(
    config: PlayerConfig,
    mut commands: mpsc::Receiver<PlayerCommand>,
    event_tx: mpsc::Sender<PlayerEvent>,
) {
    let (mpv_tx, mut mpv_rx) = mpsc::channel::<MpvEvent>(64);
    let binary = platform::find_mpv_binary(config.mpv_path.as_deref());
    match &binary {
        Some(path) => info!("player: using mpv at {:?}", path),
        None => warn!("player: no mpv binary found"),
    }
    let mut player = Player {
        config,
        binary,
        driver: MpvDriver::new(platform::mpv_socket_name()),
        handle: None,
        mpv_events: mpv_tx,
        current: None,
    };

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    PlayerCommand::Play { channel, url, license } => {
                        info!("player: play '{}'", channel);
                        player.current = Some(channel.clone());
                        if let Err(e) = player.play(&url, license.as_deref(), &channel).await {
                            warn!("player: {}", e);
                            player.current = None;
                            let event = PlayerEvent {
                                channel,
                                outcome: PlaybackOutcome::Failed(e.to_string()),
                            };
                            if event_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                    }
                    PlayerCommand::Stop => player.stop().await,
                    PlayerCommand::Shutdown => break,
                }
            }
            Some(ev) = mpv_rx.recv() => {
                let Some(outcome) = classify(&ev) else { continue };
                let Some(channel) = player.current.clone() else {
                    debug!("player: {:?} with nothing loaded", outcome);
                    continue;
                };
                if outcome != PlaybackOutcome::Loaded {
                    player.current = None;
                }
                if event_tx.send(PlayerEvent { channel, outcome }).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(handle) = &player.handle {
        handle.quit().await;
    }
    player.driver.kill().await;
    debug!("player: task exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(raw: serde_json::Value) -> MpvEvent {
        MpvEvent { raw }
    }

    #[test]
    fn load_and_failure_are_outcomes() {
        assert_eq!(
            classify(&event(json!({"event": "file-loaded"}))),
            Some(PlaybackOutcome::Loaded)
        );
        assert_eq!(
            classify(&event(
                json!({"event": "end-file", "reason": "error", "file_error": "loading failed"})
            )),
            Some(PlaybackOutcome::Failed("loading failed".into()))
        );
        assert_eq!(
            classify(&event(json!({"event": "end-file", "reason": "eof"}))),
            Some(PlaybackOutcome::Ended)
        );
    }

    #[test]
    fn requested_stops_are_ignored() {
        assert_eq!(classify(&event(json!({"event": "end-file", "reason": "stop"}))), None);
        assert_eq!(classify(&event(json!({"event": "end-file", "reason": "quit"}))), None);
        assert_eq!(classify(&event(json!({"event": "start-file"}))), None);
        assert_eq!(classify(&event(json!({"request_id": 3}))), None);
    }

    #[tokio::test]
    async fn missing_binary_reports_failure_for_the_channel() {
        let config = PlayerConfig {
            mpv_path: Some(PathBuf::from("/nonexistent/livetv-test-mpv")),
            ..PlayerConfig::default()
        };
        let mut player = Player {
            config,
            binary: None,
            driver: MpvDriver::new("unused".into()),
            handle: None,
            mpv_events: mpsc::channel(1).0,
            current: None,
        };
        let err = player.play("http://x/a.m3u8", None, "A").await.unwrap_err();
        assert!(matches!(err, PlayerError::BinaryNotFound));
    }
}
