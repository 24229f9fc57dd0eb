//! Telegram bot shell.
//!
//! Routes commands and listing links to the gallery navigator and the photo
//! pipeline. Access is gated by the allow-list; only the administrator can
//! change it.

mod commands;
mod handlers;
mod sink;

pub use commands::Command;
pub use handlers::HandlerResult;
pub use sink::TelegramAlbumSink;

use std::sync::Arc;

use anyhow::Context;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::repository::AllowList;
use crate::scrapers::GalleryNavigator;
use crate::services::PhotoPipeline;

/// State shared by all handlers.
#[derive(Clone)]
pub struct BotState {
    pub allow_list: Arc<RwLock<AllowList>>,
    pub navigator: Arc<GalleryNavigator>,
    pub pipeline: Arc<PhotoPipeline>,
    pub admin_id: u64,
    pub notify_admin_on_denied: bool,
}

/// Poll for updates until the process is interrupted.
///
/// Fails early if the token is rejected or Telegram is unreachable.
pub async fn run(bot: Bot, state: BotState) -> anyhow::Result<()> {
    let me = bot
        .get_me()
        .await
        .context("Failed to reach Telegram with the configured token")?;
    info!("Logged in as @{}", me.username());

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Could not register bot commands: {}", e);
    }

    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handlers::command),
        )
        .branch(dptree::endpoint(handlers::text));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_| async {})
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error occurred in the update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped");
    Ok(())
}
