mod action;
mod app;
mod app_state;
mod component;
mod components;
mod focus;
mod mpv;
mod player;
mod share;
mod theme;
mod widgets;

use std::path::PathBuf;

use clap::Parser;

use livetv_proto::catalog::{CatalogClient, RetryPolicy};
use livetv_proto::config::Config;
use livetv_proto::query::{QueryClient, QueryOptions};
use livetv_proto::route::Route;
use livetv_proto::session::{LogTracker, Session};

#[derive(Parser)]
#[command(name = "livetv")]
#[command(author, version, about = "Browse and watch live TV channels from the terminal")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog base URL (overrides catalog.base_url)
    #[arg(long)]
    base_url: Option<String>,

    /// Category tab selected on startup
    #[arg(long)]
    category: Option<String>,

    /// Open a path or shared link directly, e.g. /watch/live/Star%20Sports%201
    #[arg(long)]
    open: Option<String>,

    /// Signed-in user label attached to tracked events
    #[arg(long)]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = livetv_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("tui.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("livetv log: {}", log_path.display());
    tracing::info!("livetv starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!("config load failed, using defaults: {}", e);
        Config::default()
    });
    if let Some(url) = cli.base_url {
        config.catalog.base_url = url;
    }
    if let Some(category) = cli.category {
        config.catalog.default_category = category;
    }

    // Parse before touching the terminal so a bad path is reported plainly.
    let initial_route = cli.open.as_deref().map(Route::parse).transpose()?;

    // ── Catalog + query cache ────────────────────────────────────────────────
    let client = CatalogClient::new(&config.catalog.base_url, config.catalog.request_timeout())?;
    let query = QueryClient::new(
        client,
        QueryOptions {
            stale_after: config.catalog.stale_after(),
            retry: RetryPolicy {
                max_retries: config.catalog.max_retries,
                ..RetryPolicy::default()
            },
        },
    );
    let session = Session::new(cli.user, std::sync::Arc::new(LogTracker));

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let mut app = app::App::new(
        query,
        session,
        &config.catalog.default_category,
        config.catalog.base_url.clone(),
        config.player.clone(),
        config.share.clone(),
        log_path,
    );
    if let Some(route) = initial_route {
        app = app.with_initial_route(route);
    }
    app.run().await?;

    Ok(())
}
