//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks:
//!   terminal input, catalog fetches, player outcomes, share results.
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Fetch results are keyed; a result for a key that is no longer active
//!   is logged and dropped.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use livetv_proto::catalog::CatalogSource;
use livetv_proto::channel::Channel;
use livetv_proto::config::{PlayerConfig, ShareConfig};
use livetv_proto::detail::{similar_channels, DetailResolver, RandomSampler, Sampler};
use livetv_proto::query::{FetchResult, QueryClient};
use livetv_proto::route::Route;
use livetv_proto::session::{Session, TrackEvent};

use crate::{
    action::{Action, ComponentId},
    app_state::{AppState, PlaybackStatus},
    component::Component,
    components::{
        category_tabs::CategoryTabs, channel_grid::ChannelGrid, header, help_overlay::HelpOverlay,
        log_panel::LogPanel, player_page::PlayerPage,
    },
    focus::FocusRing,
    player::{spawn_player, PlaybackOutcome, PlayerEvent, PlayerHandle},
    share::{self, ShareOutcome, ShareRequest},
    widgets::{
        status_bar::{self, InputMode},
        toast::ToastManager,
    },
};

// ── Internal event bus ────────────────────────────────────────────────────────

pub enum AppMessage {
    Event(Event),
    CategoriesLoaded(FetchResult<Vec<String>>),
    /// Channels for the named category.
    ChannelsLoaded(String, FetchResult<Vec<Channel>>),
    /// Working set for the detail page of the named channel.
    WorkingSetLoaded(String, FetchResult<Vec<Channel>>),
    Player(PlayerEvent),
    Shared(Result<ShareOutcome, String>),
}

const LOG_TAIL_LINES: usize = 500;
const LOG_PANEL_HEIGHT: u16 = 10;

// ── Pane area tracking ────────────────────────────────────────────────────────

/// Last-drawn rects of the focusable panes, for mouse hit-testing.
#[derive(Default, Clone, Copy)]
struct PaneAreas {
    tabs: Rect,
    grid: Rect,
    player: Rect,
    log: Rect,
}

pub struct App<S: CatalogSource> {
    query: QueryClient<S>,
    session: Session,
    pub state: AppState,

    category_tabs: CategoryTabs,
    channel_grid: ChannelGrid,
    player_page: PlayerPage,
    log_panel: LogPanel,
    help_overlay: HelpOverlay,

    focus: FocusRing,
    toast: ToastManager,
    pane_areas: PaneAreas,
    show_keys_bar: bool,
    should_quit: bool,

    player_config: PlayerConfig,
    player: Option<PlayerHandle>,
    share_config: ShareConfig,
    sampler: Box<dyn Sampler + Send>,
    /// Route requested on the command line, opened once at startup.
    initial_route: Option<Route>,
    tui_log_path: PathBuf,

    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,
}

impl<S: CatalogSource> App<S> {
    pub fn new(
        query: QueryClient<S>,
        session: Session,
        default_category: &str,
        catalog_url: String,
        player_config: PlayerConfig,
        share_config: ShareConfig,
        tui_log_path: PathBuf,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<AppMessage>(256);
        let state = AppState::new(
            default_category,
            session.user().map(str::to_string),
            catalog_url,
        );
        Self {
            query,
            session,
            state,
            category_tabs: CategoryTabs::new(),
            channel_grid: ChannelGrid::new(),
            player_page: PlayerPage::new(),
            log_panel: LogPanel::new(),
            help_overlay: HelpOverlay::new(),
            focus: FocusRing::new(vec![ComponentId::CategoryTabs, ComponentId::ChannelGrid]),
            toast: ToastManager::new(),
            pane_areas: PaneAreas::default(),
            show_keys_bar: true,
            should_quit: false,
            player_config,
            player: None,
            share_config,
            sampler: Box::new(RandomSampler),
            initial_route: None,
            tui_log_path,
            tx,
            rx: Some(rx),
        }
    }

    /// Open `route` right after startup, as if following a link.
    pub fn with_initial_route(mut self, route: Route) -> Self {
        self.initial_route = Some(route);
        self
    }

    pub fn with_sampler(mut self, sampler: Box<dyn Sampler + Send>) -> Self {
        self.sampler = sampler;
        self
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let Some(mut rx) = self.rx.take() else {
            anyhow::bail!("app event loop already started");
        };

        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: player outcomes → AppMessage ─────────────────────
        let (player_tx, mut player_rx) = mpsc::channel::<PlayerEvent>(32);
        self.player = Some(spawn_player(self.player_config.clone(), player_tx));
        let fwd_tx = self.tx.clone();
        tokio::spawn(async move {
            while let Some(ev) = player_rx.recv().await {
                if fwd_tx.send(AppMessage::Player(ev)).await.is_err() {
                    break;
                }
            }
        });

        self.start().await;

        // ── Periodic timers ───────────────────────────────────────────────────
        // Toast expiry + spinner animation.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // tui.log tail refresh.
        let mut log_refresh = tokio::time::interval(Duration::from_secs(2));
        log_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg).await;
                    // Drain whatever else is queued before the next frame.
                    while let Ok(next) = rx.try_recv() {
                        needs_redraw |= self.handle_message(next).await;
                    }
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }

                _ = log_refresh.tick() => {
                    self.reload_tui_log();
                    needs_redraw = true;
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        if let Some(player) = &self.player {
            player.shutdown();
        }
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("livetv exiting");

        Ok(())
    }

    /// Kick off the initial fetches and open the requested route.
    async fn start(&mut self) {
        if self.state.categories.select(Some(())) {
            self.spawn_categories();
        }
        self.load_active_category().await;
        self.session.track(TrackEvent::PageView {
            path: Route::Live.path(),
        });
        if let Some(route) = self.initial_route.take() {
            if route != Route::Live {
                self.navigate(route);
            }
        }
    }

    // ── Message handling ──────────────────────────────────────────────────────

    /// Returns whether a redraw is needed.
    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return false;
                    }
                    for a in self.handle_key(key) {
                        self.dispatch(a).await;
                    }
                }
                Event::Mouse(mouse) => {
                    for a in self.handle_mouse(mouse) {
                        self.dispatch(a).await;
                    }
                }
                Event::Resize(_, _) => {}
                _ => return false,
            },

            AppMessage::CategoriesLoaded(result) => {
                if let Ok(list) = &result {
                    info!("{} categories available", list.len());
                    self.state.tabs.set_categories(list.to_vec());
                }
                if let Err(e) = &result {
                    self.toast.error(e.message().to_string());
                }
                self.state.categories.accept(&(), result);
            }

            AppMessage::ChannelsLoaded(category, result) => {
                self.on_channels_loaded(category, result);
            }

            AppMessage::WorkingSetLoaded(id, result) => {
                self.on_working_set_loaded(id, result);
            }

            AppMessage::Player(ev) => self.on_player_event(ev),

            AppMessage::Shared(result) => match result {
                Ok(ShareOutcome::Copied) => self
                    .toast
                    .success_with("Link copied to clipboard", "You can now share it with anyone!"),
                Ok(ShareOutcome::Shared) => self.toast.success("Shared"),
                Err(e) => {
                    warn!("share failed: {}", e);
                    self.toast.error(format!("Could not share: {}", e));
                }
            },
        }
        true
    }

    fn on_channels_loaded(&mut self, category: String, result: FetchResult<Vec<Channel>>) {
        let outcome = result
            .as_ref()
            .map(Arc::clone)
            .map_err(|e| e.message().to_string());
        if !self.state.channels.accept(&category, result) {
            debug!("dropping channels for {:?}: no longer selected", category);
            return;
        }
        match outcome {
            Ok(list) => {
                self.state.channels_updated = Some(Local::now());
                self.channel_grid.set_channels(&list);
            }
            Err(message) => {
                self.channel_grid.clear();
                self.toast.error(message);
            }
        }
    }

    fn on_working_set_loaded(&mut self, id: String, result: FetchResult<Vec<Channel>>) {
        let Some(detail) = self.state.detail.as_mut() else {
            debug!("dropping working set for {:?}: detail page closed", id);
            return;
        };
        if detail.id() != id {
            debug!("dropping working set for {:?}: now showing {:?}", id, detail.id());
            return;
        }
        self.toast.dismiss_spinner();

        let was_loading = detail.is_loading();
        if let Err(e) = &result {
            warn!("working set for {:?} failed: {}", id, e);
            self.toast.warning(e.message().to_string());
        }
        detail.apply_working_set(result);
        let found = detail.channel().cloned();

        if was_loading {
            match found {
                Some(channel) => self.open_channel(channel),
                None => info!("channel {:?} not found", id),
            }
        }
        self.refresh_similar();
    }

    fn on_player_event(&mut self, ev: PlayerEvent) {
        let current = self.state.current_channel().map(|c| c.channel_name.clone());
        if current.as_deref() != Some(ev.channel.as_str()) {
            debug!("ignoring player event for {:?}", ev.channel);
            return;
        }
        self.state.playback = match ev.outcome {
            PlaybackOutcome::Loaded => PlaybackStatus::Playing,
            PlaybackOutcome::Ended => PlaybackStatus::Ended,
            PlaybackOutcome::Failed(reason) => {
                warn!("playback of {:?} failed: {}", ev.channel, reason);
                self.toast.error_with(
                    "Playback error",
                    "Failed to load the live stream. Please try again later.",
                );
                self.session.track(TrackEvent::PlaybackFailed {
                    channel: ev.channel.clone(),
                });
                PlaybackStatus::Failed(reason)
            }
        };
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let normal = self.state.input_mode == InputMode::Normal;

        // Global keys
        match key.code {
            KeyCode::Char('c') if key.modifiers == KeyModifiers::CONTROL => {
                return vec![Action::Quit];
            }
            KeyCode::Char('q') if normal && !self.help_overlay.visible => {
                return vec![Action::Quit];
            }
            KeyCode::Char('?') if normal => return vec![Action::ToggleHelp],
            KeyCode::Char('L') if normal => return vec![Action::ToggleLogs],
            KeyCode::Char('K') if normal => return vec![Action::ToggleKeys],
            _ => {}
        }

        // Help overlay captures all keys when visible
        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }

        match key.code {
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            _ => {}
        }

        if normal {
            match key.code {
                KeyCode::F(5) | KeyCode::Char('R') => return vec![Action::Refresh],
                KeyCode::Char('[') if self.state.route == Route::Live => {
                    return vec![Action::PrevCategory];
                }
                KeyCode::Char(']') if self.state.route == Route::Live => {
                    return vec![Action::NextCategory];
                }
                _ => {}
            }
        }

        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::CategoryTabs) => self.category_tabs.handle_key(key, s),
            Some(ComponentId::ChannelGrid) => self.channel_grid.handle_key(key, s),
            Some(ComponentId::PlayerPage) => self.player_page.handle_key(key, s),
            Some(ComponentId::LogPanel) => self.log_panel.handle_key(key, s),
            None => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let is_click = matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if !is_click || self.help_overlay.visible {
            return vec![];
        }

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0
                && r.height > 0
                && col >= r.x
                && col < r.x + r.width
                && row >= r.y
                && row < r.y + r.height
        }

        let areas = self.pane_areas;
        let (col, row) = (event.column, event.row);
        let s = &self.state;

        macro_rules! click_pane {
            ($id:expr, $component:expr, $area:expr) => {{
                let mut actions = $component.handle_mouse(event, $area, s);
                if self.focus.current() != Some($id) {
                    actions.insert(0, Action::FocusPane($id));
                }
                return actions;
            }};
        }

        if hit(areas.tabs, col, row) {
            click_pane!(ComponentId::CategoryTabs, self.category_tabs, areas.tabs);
        }
        if hit(areas.grid, col, row) {
            click_pane!(ComponentId::ChannelGrid, self.channel_grid, areas.grid);
        }
        if hit(areas.player, col, row) {
            click_pane!(ComponentId::PlayerPage, self.player_page, areas.player);
        }
        if hit(areas.log, col, row) && self.log_panel.expanded {
            click_pane!(ComponentId::LogPanel, self.log_panel, areas.log);
        }
        vec![]
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        // Components see the action first, against the pre-action state.
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.category_tabs.on_action(&action, s));
            out.extend(self.channel_grid.on_action(&action, s));
            out.extend(self.player_page.on_action(&action, s));
            out.extend(self.log_panel.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action).await;

        // Secondary actions are applied one level deep only.
        for a in secondary {
            self.apply_action(a).await;
        }

        // Components may have closed the filter while reacting.
        self.sync_input_mode();
    }

    async fn apply_action(&mut self, action: Action) {
        if !matches!(action, Action::FilterChanged(_)) {
            debug!("apply_action: {:?}", action);
        }
        match action {
            // ── Routing ───────────────────────────────────────────────────────
            Action::Navigate(Route::Live) | Action::Back => self.go_live(),
            Action::Navigate(route) => self.navigate(route),

            // ── Categories ────────────────────────────────────────────────────
            Action::SelectCategory(category) => {
                if self.state.tabs.select(&category) {
                    self.session.track(TrackEvent::CategorySelected { category });
                }
                self.load_active_category().await;
            }
            Action::NextCategory => {
                if self.state.tabs.next() {
                    self.on_tab_stepped().await;
                }
            }
            Action::PrevCategory => {
                if self.state.tabs.prev() {
                    self.on_tab_stepped().await;
                }
            }
            Action::Refresh => self.refresh(),

            // ── Focus ─────────────────────────────────────────────────────────
            Action::FocusNext => {
                self.focus.next();
                self.sync_input_mode();
            }
            Action::FocusPrev => {
                self.focus.prev();
                self.sync_input_mode();
            }
            Action::FocusPane(id) => {
                self.focus.set(id);
                self.sync_input_mode();
            }

            // ── Filter ────────────────────────────────────────────────────────
            Action::OpenFilter => self.state.input_mode = InputMode::Filter,
            Action::CloseFilter => self.state.input_mode = InputMode::Normal,

            // ── Detail page ───────────────────────────────────────────────────
            Action::Share => self.share(),
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }

            // ── UI toggles ────────────────────────────────────────────────────
            Action::ToggleLogs => {
                // LogPanel flipped `expanded` in on_action already.
                self.focus.set_items(self.focus_items());
                if self.log_panel.expanded {
                    self.reload_tui_log();
                    self.focus.set(ComponentId::LogPanel);
                }
            }
            Action::ToggleKeys => self.show_keys_bar = !self.show_keys_bar,

            // ── System ────────────────────────────────────────────────────────
            Action::Quit => self.should_quit = true,

            // Handled at component level
            Action::ToggleHelp | Action::FilterChanged(_) => {}
        }
    }

    // ── Category flow ─────────────────────────────────────────────────────────

    async fn on_tab_stepped(&mut self) {
        self.session.track(TrackEvent::CategorySelected {
            category: self.state.tabs.active().to_string(),
        });
        self.load_active_category().await;
    }

    /// Point the channel query at the active tab, serving a fresh cached
    /// list immediately and fetching otherwise.
    async fn load_active_category(&mut self) {
        let active = self.state.tabs.active().to_string();
        let key = Some(active.clone()).filter(|c| !c.trim().is_empty());
        if !self.state.channels.select(key) {
            return;
        }
        self.channel_grid.clear();
        if let Some(list) = self.query.cached_channels(&active).await {
            debug!("channels[{}] served from cache", active);
            self.on_channels_loaded(active, Ok(list));
            return;
        }
        self.spawn_channels(active);
    }

    fn spawn_categories(&self) {
        let query = self.query.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = query.categories().await;
            let _ = tx.send(AppMessage::CategoriesLoaded(result)).await;
        });
    }

    fn spawn_channels(&self, category: String) {
        let query = self.query.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = query.channels(&category).await;
            let _ = tx.send(AppMessage::ChannelsLoaded(category, result)).await;
        });
    }

    fn spawn_working_set(&self, id: String, invalidate: bool) {
        let query = self.query.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if invalidate {
                query.invalidate_all().await;
            }
            let result = query.all_channels().await;
            let _ = tx.send(AppMessage::WorkingSetLoaded(id, result)).await;
        });
    }

    /// Drop cached catalog data for the current page and fetch it again.
    fn refresh(&mut self) {
        self.toast.info("Refreshing channels");
        match &self.state.route {
            Route::Live => {
                self.state.categories.reload();
                let category = self.state.channels.reload().cloned();
                if category.is_some() {
                    self.channel_grid.clear();
                }
                let query = self.query.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    query.invalidate_categories().await;
                    if let Some(c) = &category {
                        query.invalidate_channels(c).await;
                    }
                    let categories = query.categories().await;
                    let _ = tx.send(AppMessage::CategoriesLoaded(categories)).await;
                    if let Some(c) = category {
                        let channels = query.channels(&c).await;
                        let _ = tx.send(AppMessage::ChannelsLoaded(c, channels)).await;
                    }
                });
            }
            Route::Watch { id, .. } => self.spawn_working_set(id.clone(), true),
        }
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    fn navigate(&mut self, route: Route) {
        let Route::Watch { id, state } = route.clone() else {
            self.go_live();
            return;
        };
        info!("navigate {}", route.path());
        self.session.track(TrackEvent::PageView { path: route.path() });

        let detail = DetailResolver::from_navigation(id.clone(), state);
        let resolved = detail.channel().cloned();
        self.state.route = route;
        self.state.detail = Some(detail);
        self.state.similar.clear();
        self.state.playback = PlaybackStatus::Idle;
        self.state.input_mode = InputMode::Normal;
        self.focus.set_items(self.focus_items());
        self.focus.set(ComponentId::PlayerPage);

        match resolved {
            Some(channel) => self.open_channel(channel),
            None => {
                self.stop_playback();
                self.toast.spinner("Loading stream…");
            }
        }
        self.spawn_working_set(id, false);
    }

    fn go_live(&mut self) {
        if self.state.route == Route::Live {
            return;
        }
        self.stop_playback();
        self.toast.dismiss_spinner();
        self.state.route = Route::Live;
        self.state.detail = None;
        self.state.similar.clear();
        self.state.playback = PlaybackStatus::Idle;
        self.focus.set_items(self.focus_items());
        self.focus.set(ComponentId::ChannelGrid);
        self.session.track(TrackEvent::PageView {
            path: Route::Live.path(),
        });
    }

    /// The detail page has its channel: start playing it.
    fn open_channel(&mut self, channel: Channel) {
        self.session.track(TrackEvent::ChannelOpened {
            channel: channel.channel_name.clone(),
        });
        match &self.player {
            Some(player) => {
                player.play(&channel.channel_name, &channel.url, channel.license());
                self.state.playback = PlaybackStatus::Starting;
            }
            None => warn!("no player running; not playing {:?}", channel.channel_name),
        }
    }

    fn stop_playback(&self) {
        if let Some(player) = &self.player {
            player.stop();
        }
    }

    fn refresh_similar(&mut self) {
        let Some(detail) = &self.state.detail else {
            return;
        };
        let (Some(current), Some(set)) = (detail.channel(), detail.working_set()) else {
            return;
        };
        self.state.similar = similar_channels(current, set, self.sampler.as_mut());
    }

    fn share(&mut self) {
        let Route::Watch { .. } = &self.state.route else {
            return;
        };
        let url = self.state.route.share_url(&self.share_config.base_url);
        let request = ShareRequest::for_channel(self.state.current_channel(), url.clone());
        self.session.track(TrackEvent::Shared { url });
        let command = self.share_config.command.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = share::share(request, command).await;
            let _ = tx.send(AppMessage::Shared(result)).await;
        });
    }

    // ── Focus ─────────────────────────────────────────────────────────────────

    fn focus_items(&self) -> Vec<ComponentId> {
        let mut items = match self.state.route {
            Route::Live => vec![ComponentId::CategoryTabs, ComponentId::ChannelGrid],
            Route::Watch { .. } => vec![ComponentId::PlayerPage],
        };
        if self.log_panel.expanded {
            items.push(ComponentId::LogPanel);
        }
        items
    }

    fn sync_input_mode(&mut self) {
        if !self.channel_grid.filter_active() {
            self.state.input_mode = InputMode::Normal;
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        // ── Outer layout: header | body | log | keys ─────────────────────────
        let log_h = if self.log_panel.expanded {
            LOG_PANEL_HEIGHT
        } else {
            1
        };
        let keys_h = if self.show_keys_bar { 1 } else { 0 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(log_h),
                Constraint::Length(keys_h),
            ])
            .split(area);

        header::draw_header(frame, outer[0], &self.state);

        let body = outer[1];
        self.pane_areas = PaneAreas::default();
        match self.state.route {
            Route::Live => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Min(0),
                    ])
                    .split(body);
                let tabs_focused = self.focus.is_focused(ComponentId::CategoryTabs);
                self.category_tabs
                    .draw(frame, rows[0], tabs_focused, &self.state);
                status_bar::draw_separator(frame, rows[1]);
                let grid_focused = self.focus.is_focused(ComponentId::ChannelGrid);
                self.channel_grid
                    .draw(frame, rows[2], grid_focused, &self.state);
                self.pane_areas.tabs = rows[0];
                self.pane_areas.grid = rows[2];
            }
            Route::Watch { .. } => {
                let focused = self.focus.is_focused(ComponentId::PlayerPage);
                self.player_page.draw(frame, body, focused, &self.state);
                self.pane_areas.player = body;
            }
        }

        let log_focused = self.focus.is_focused(ComponentId::LogPanel);
        self.log_panel
            .draw(frame, outer[2], log_focused, &self.state);
        self.pane_areas.log = outer[2];

        if self.show_keys_bar {
            status_bar::draw_keys_bar(frame, outer[3], self.state.input_mode, &self.state.route);
        }

        // ── Help overlay (on top of everything) ──────────────────────────────
        self.help_overlay.draw(frame, area, false, &self.state);

        // ── Toast notifications (topmost layer) ──────────────────────────────
        self.toast.draw(frame, area);
    }

    /// Read the tail of tui.log into state.tui_log_lines.
    fn reload_tui_log(&mut self) {
        if let Ok(content) = std::fs::read_to_string(&self.tui_log_path) {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(LOG_TAIL_LINES);
            self.state.tui_log_lines = lines[start..].iter().map(|l| l.to_string()).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use livetv_proto::catalog::{CatalogError, RetryPolicy};
    use livetv_proto::detail::{Resolution, SeededSampler};
    use livetv_proto::query::QueryOptions;

    #[derive(Default)]
    struct FakeSource {
        categories: Vec<String>,
        channels: HashMap<String, Vec<Channel>>,
        channel_calls: AtomicUsize,
    }

    impl CatalogSource for FakeSource {
        async fn categories(&self) -> Result<Vec<String>, CatalogError> {
            Ok(self.categories.clone())
        }

        async fn channels(&self, category: &str) -> Result<Vec<Channel>, CatalogError> {
            self.channel_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.channels.get(category).cloned().unwrap_or_default())
        }
    }

    fn ch(name: &str, category: &str) -> Channel {
        Channel {
            channel_name: name.into(),
            logo: String::new(),
            category: category.into(),
            url: format!("http://cdn.example/{}.m3u8", name),
            license_key: None,
        }
    }

    fn app() -> App<FakeSource> {
        let mut source = FakeSource {
            categories: vec!["news".into(), "sports".into()],
            ..FakeSource::default()
        };
        source.channels.insert("news".into(), vec![ch("N1", "news")]);
        source.channels.insert(
            "sports".into(),
            vec![ch("S1", "sports"), ch("S2", "sports"), ch("S3", "sports")],
        );
        let query = QueryClient::new(
            source,
            QueryOptions {
                retry: RetryPolicy::immediate(0),
                ..QueryOptions::default()
            },
        );
        App::new(
            query,
            Session::anonymous(),
            "news",
            "http://catalog.test".into(),
            PlayerConfig::default(),
            ShareConfig::default(),
            PathBuf::from("/nonexistent/tui.log"),
        )
        .with_sampler(Box::new(SeededSampler::new(7)))
    }

    /// Handle queued background messages until `done` holds.
    async fn pump(app: &mut App<FakeSource>, rx: &mut mpsc::Receiver<AppMessage>, done: impl Fn(&App<FakeSource>) -> bool) {
        while !done(app) {
            let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("timed out waiting for app message")
                .expect("channel closed");
            app.handle_message(msg).await;
        }
    }

    #[tokio::test]
    async fn startup_loads_tabs_and_default_category() {
        let mut app = app();
        let mut rx = app.rx.take().unwrap();
        app.start().await;
        pump(&mut app, &mut rx, |a| {
            a.state.channels.data().is_some() && a.state.categories.data().is_some()
        })
        .await;
        assert_eq!(app.state.tabs.categories(), ["news", "sports"]);
        assert_eq!(app.state.channel_list().unwrap().len(), 1);
        assert!(app.state.channels_updated.is_some());
    }

    #[tokio::test]
    async fn superseded_category_result_is_dropped() {
        let mut app = app();
        let mut rx = app.rx.take().unwrap();
        app.start().await;
        app.apply_action(Action::SelectCategory("sports".into())).await;
        // A late "news" result must not replace the pending sports query.
        app.on_channels_loaded("news".into(), Ok(Arc::new(vec![ch("late", "news")])));
        assert!(app.state.channels.is_loading());
        pump(&mut app, &mut rx, |a| a.state.channels.data().is_some()).await;
        let names: Vec<&str> = app
            .state
            .channel_list()
            .unwrap()
            .iter()
            .map(|c| c.channel_name.as_str())
            .collect();
        assert_eq!(names, vec!["S1", "S2", "S3"]);
    }

    #[tokio::test]
    async fn reselecting_a_loaded_category_uses_the_cache() {
        let mut app = app();
        let mut rx = app.rx.take().unwrap();
        app.start().await;
        pump(&mut app, &mut rx, |a| a.state.channels.data().is_some()).await;
        app.apply_action(Action::SelectCategory("sports".into())).await;
        pump(&mut app, &mut rx, |a| a.state.channels.data().is_some()).await;
        app.apply_action(Action::SelectCategory("news".into())).await;
        // Served from cache without a round trip through the message bus.
        assert!(app.state.channels.data().is_some());
        assert_eq!(app.query.source().channel_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn direct_link_resolves_and_picks_similar() {
        let mut app = app();
        let mut rx = app.rx.take().unwrap();
        app.navigate(Route::parse("/watch/live/S1").unwrap());
        assert!(app.state.detail.as_ref().unwrap().is_loading());
        pump(&mut app, &mut rx, |a| {
            !a.state.detail.as_ref().is_some_and(DetailResolver::is_loading)
        })
        .await;
        assert_eq!(app.state.current_channel().unwrap().channel_name, "S1");
        let mut similar: Vec<&str> = app.state.similar.iter().map(|c| c.channel_name.as_str()).collect();
        similar.sort();
        assert_eq!(similar, vec!["S2", "S3"]);
    }

    #[tokio::test]
    async fn unknown_link_settles_not_found_and_back_returns_live() {
        let mut app = app();
        let mut rx = app.rx.take().unwrap();
        app.navigate(Route::parse("/watch/live/Nope").unwrap());
        pump(&mut app, &mut rx, |a| {
            !a.state.detail.as_ref().is_some_and(DetailResolver::is_loading)
        })
        .await;
        assert_eq!(
            app.state.detail.as_ref().unwrap().resolution(),
            &Resolution::NotFound
        );
        app.dispatch(Action::Back).await;
        assert_eq!(app.state.route, Route::Live);
        assert!(app.state.detail.is_none());
    }

    #[tokio::test]
    async fn switching_category_from_open_filter_restores_normal_keys() {
        let mut app = app();
        let mut rx = app.rx.take().unwrap();
        app.start().await;
        pump(&mut app, &mut rx, |a| a.state.channels.data().is_some()).await;

        app.dispatch(Action::FocusPane(ComponentId::ChannelGrid)).await;
        for a in app.handle_key(KeyEvent::from(KeyCode::Char('/'))) {
            app.dispatch(a).await;
        }
        assert_eq!(app.state.input_mode, InputMode::Filter);

        // A tab click focuses the strip first, then selects.
        app.dispatch(Action::FocusPane(ComponentId::CategoryTabs)).await;
        app.dispatch(Action::SelectCategory("sports".into())).await;

        assert!(!app.channel_grid.filter_active());
        assert_eq!(app.state.input_mode, InputMode::Normal);
        let actions = app.handle_key(KeyEvent::from(KeyCode::Char('q')));
        assert!(matches!(actions.as_slice(), [Action::Quit]));
    }

    #[tokio::test]
    async fn playback_failure_marks_page_without_leaving_it() {
        let mut app = app();
        app.navigate(Route::watch(ch("S1", "sports")));
        app.on_player_event(PlayerEvent {
            channel: "S1".into(),
            outcome: PlaybackOutcome::Failed("loading failed".into()),
        });
        assert_eq!(
            app.state.playback,
            PlaybackStatus::Failed("loading failed".into())
        );
        assert!(matches!(app.state.route, Route::Watch { .. }));
        assert!(app
            .toast
            .messages()
            .iter()
            .any(|m| m.contains("Playback error")));

        // Outcomes for a channel no longer shown are ignored.
        app.on_player_event(PlayerEvent {
            channel: "other".into(),
            outcome: PlaybackOutcome::Loaded,
        });
        assert!(matches!(app.state.playback, PlaybackStatus::Failed(_)));
    }
}
