//! Action enum — all user-initiated intents and internal events.

use livetv_proto::route::Route;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    CategoryTabs,
    ChannelGrid,
    PlayerPage,
    LogPanel,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Routing ──────────────────────────────────────────────────────────────
    Navigate(Route),
    /// Leave the detail page for the listing.
    Back,

    // ── Categories ───────────────────────────────────────────────────────────
    SelectCategory(String),
    NextCategory,
    PrevCategory,
    Refresh,

    // ── Focus ────────────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── Filter/search ────────────────────────────────────────────────────────
    OpenFilter,
    CloseFilter,
    FilterChanged(String),

    // ── Detail page ──────────────────────────────────────────────────────────
    Share,
    CopyToClipboard(String),

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleLogs,
    ToggleHelp,
    ToggleKeys,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
