pub mod category_tabs;
pub mod channel_grid;
pub mod header;
pub mod help_overlay;
pub mod log_panel;
pub mod player_page;
