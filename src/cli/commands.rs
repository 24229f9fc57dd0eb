//! CLI commands implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use teloxide::Bot;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::bot::{self, BotState};
use crate::config::Settings;
use crate::models::{is_listing_url, SiteVariant};
use crate::repository::AllowList;
use crate::scrapers::{resolve_user_agent, BrowserLauncher, ChromeLauncher, GalleryNavigator};
use crate::server;
use crate::services::{ImageFetcher, PhotoPipeline};
use crate::supervisor::run_supervised;

#[derive(Parser)]
#[command(name = "adphotos")]
#[command(about = "Telegram bot that collects listing photos from Otodom and OLX")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML)
    #[arg(short, long, global = true, env = "ADPHOTOS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (default)
    Run,

    /// Find the photos of a listing and print them (does not download)
    Discover {
        /// Listing URL on otodom.pl or olx.pl
        url: String,
        /// Print candidates as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd_run(settings).await,
        Commands::Discover { url, json } => cmd_discover(settings, &url, json).await,
    }
}

fn build_navigator(settings: &Settings, user_agent: &str) -> GalleryNavigator {
    let launcher: Arc<dyn BrowserLauncher> = Arc::new(
        ChromeLauncher::new(settings.browser.clone()).with_user_agent(user_agent.to_string()),
    );
    GalleryNavigator::new(
        launcher,
        settings.gallery.clone(),
        settings.pipeline.min_size(),
    )
}

async fn cmd_run(settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = settings.require_bot() {
        error!("Cannot start the bot: {}", e);
        return Err(e.into());
    }

    let user_agent = resolve_user_agent(settings.pipeline.user_agent.as_deref());
    let allow_list = AllowList::load(&settings.users_file, settings.admin_id, settings.max_users);
    info!("Allowed users: {}", allow_list.len());

    let fetcher = ImageFetcher::new(
        settings.pipeline.request_timeout(),
        settings.pipeline.min_image_bytes,
        Some(user_agent),
    )?;

    let state = BotState {
        allow_list: Arc::new(RwLock::new(allow_list)),
        navigator: Arc::new(build_navigator(&settings, user_agent)),
        pipeline: Arc::new(PhotoPipeline::new(
            Arc::new(fetcher),
            settings.pipeline.clone(),
        )),
        admin_id: settings.admin_id,
        notify_admin_on_denied: settings.notify_admin_on_denied,
    };

    let port = settings.health_port;
    tokio::spawn(async move {
        if let Err(e) = server::serve_health(port).await {
            warn!("Health endpoint stopped: {:#}", e);
        }
    });

    let telegram = Bot::new(settings.bot_token.clone());
    info!("Starting bot");
    run_supervised(
        settings.restart_attempts,
        settings.restart_base_delay(),
        || bot::run(telegram.clone(), state.clone()),
    )
    .await
}

async fn cmd_discover(settings: Settings, url: &str, json: bool) -> anyhow::Result<()> {
    if !is_listing_url(url) {
        warn!("{} is not an otodom.pl or olx.pl listing URL", url);
    }

    let user_agent = resolve_user_agent(settings.pipeline.user_agent.as_deref());
    let navigator = build_navigator(&settings, user_agent);
    let site = SiteVariant::classify(url);
    let candidates = navigator.discover(url, site).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    if candidates.is_empty() {
        println!("No photos found on {}", site);
        return Ok(());
    }

    println!("{} photos on {}:", candidates.len(), site);
    for candidate in &candidates {
        println!(
            "  {:>5}x{:<5} {}",
            candidate.width, candidate.height, candidate.url
        );
    }
    Ok(())
}
