//! Message and command handlers.

use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode, User, UserId};
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;
use tracing::{error, info, warn};

use super::commands::{self, Command, NOT_ADMIN};
use super::sink::TelegramAlbumSink;
use super::BotState;
use crate::models::{is_listing_url, SiteVariant};

pub type HandlerResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const WELCOME: &str = "🏠 Hi! I collect the photos of Otodom and OLX listings.\n\n\
    ✨ What I do:\n\
    • 📸 find every photo of the listing\n\
    • 🖼️ send them in albums of 10\n\
    • ✂️ cut off the watermark (Otodom only)\n\n\
    📩 Just send me a link to a listing on:\n\
    • Otodom.pl\n\
    • OLX.pl";

const HELP: &str = "💡 How to use the bot:\n\n\
    1. Find a listing on otodom.pl or olx.pl\n\
    2. Copy its link\n\
    3. Send the link to me\n\
    4. Wait for the photos!\n\n\
    📸 Photos are grouped by 10\n\
    🔵 OLX: photos as they are\n\
    🟢 Otodom: watermark cut off";

const NO_ACCESS: &str = "🔒 You don't have access to this bot.\n\n\
    Contact the administrator to get access.";

const NOT_A_LISTING: &str = "📩 Send me a link to an Otodom or OLX listing.\n\n\
    Or use a command:\n\
    /help - usage\n\
    /my_id - your Telegram id";

const FAILURE: &str = "❌ Something went wrong. Please try again.";

fn display_name(user: &User) -> String {
    user.username
        .clone()
        .unwrap_or_else(|| user.first_name.clone())
}

/// Message sent to the administrator when someone without access writes.
pub(crate) fn denied_notice(name: &str, user_id: u64) -> String {
    format!(
        "🚫 Access attempt:\n\
         👤 User: {}\n\
         🆔 ID: {}\n\
         📝 To grant access, send:\n\
         <code>/add_user {}</code>",
        html::escape(name),
        user_id,
        user_id
    )
}

pub(crate) fn my_id_text(name: &str, user_id: u64) -> String {
    format!(
        "👤 Your profile:\n\
         🆔 ID: <code>{}</code>\n\
         📛 Name: {}\n\n\
         Send this id to the administrator to get access to the bot.",
        user_id,
        html::escape(name)
    )
}

fn delivery_summary(delivered: usize, site: SiteVariant) -> String {
    if delivered > 0 {
        format!("✅ Done! Sent {} photos from {}", delivered, site)
    } else {
        format!("❌ Could not download photos from {}", site)
    }
}

/// Send the closing summary. The albums are already in the chat, so a
/// failure here is only logged.
async fn send_summary(bot: &Bot, chat_id: ChatId, delivered: usize, site: SiteVariant) {
    if let Err(e) = bot
        .send_message(chat_id, delivery_summary(delivered, site))
        .await
    {
        warn!("Could not send delivery summary to chat {}: {}", chat_id, e);
    }
}

/// Check the sender against the allow-list, replying and notifying the
/// administrator when access is denied.
async fn ensure_allowed(bot: &Bot, msg: &Message, state: &BotState) -> HandlerResult<bool> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(false);
    };
    let user_id = user.id.0;

    if state.allow_list.read().await.is_allowed(user_id) {
        return Ok(true);
    }

    info!("Denied access to {} ({})", display_name(user), user_id);
    bot.send_message(msg.chat.id, NO_ACCESS).await?;

    if state.notify_admin_on_denied && user_id != state.admin_id {
        let notice = denied_notice(&display_name(user), user_id);
        if let Err(e) = bot
            .send_message(ChatId::from(UserId(state.admin_id)), notice)
            .parse_mode(ParseMode::Html)
            .await
        {
            warn!("Could not notify the administrator: {}", e);
        }
    }

    Ok(false)
}

pub async fn command(bot: Bot, msg: Message, cmd: Command, state: BotState) -> HandlerResult {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    let user_id = user.id.0;

    if cmd.is_admin_only() && user_id != state.admin_id {
        bot.send_message(msg.chat.id, NOT_ADMIN).await?;
        return Ok(());
    }

    match cmd {
        Command::Start => {
            if ensure_allowed(&bot, &msg, &state).await? {
                bot.send_message(msg.chat.id, WELCOME).await?;
            }
        }
        Command::Help => {
            if ensure_allowed(&bot, &msg, &state).await? {
                bot.send_message(msg.chat.id, format!("{}\n\n{}", HELP, Command::descriptions()))
                    .await?;
            }
        }
        Command::MyId => {
            bot.send_message(msg.chat.id, my_id_text(&display_name(&user), user_id))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::AddUser(arg) => {
            let reply = commands::add_user_reply(&mut *state.allow_list.write().await, &arg);
            bot.send_message(msg.chat.id, reply).await?;
        }
        Command::RemoveUser(arg) => {
            let reply = commands::remove_user_reply(&mut *state.allow_list.write().await, &arg);
            bot.send_message(msg.chat.id, reply).await?;
        }
        Command::ListUsers => {
            let reply = commands::list_users_reply(&*state.allow_list.read().await);
            bot.send_message(msg.chat.id, reply).await?;
        }
    }

    Ok(())
}

/// Plain text: a listing link starts a delivery, anything else gets a hint.
pub async fn text(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let Some(text) = msg.text().map(str::trim) else {
        return Ok(());
    };
    if text.starts_with('/') {
        return Ok(());
    }
    if !ensure_allowed(&bot, &msg, &state).await? {
        return Ok(());
    }

    if is_listing_url(text) {
        let url = text.to_string();
        listing(bot, msg, state, url).await
    } else {
        bot.send_message(msg.chat.id, NOT_A_LISTING).await?;
        Ok(())
    }
}

async fn listing(bot: Bot, msg: Message, state: BotState, url: String) -> HandlerResult {
    let site = SiteVariant::classify(&url);
    info!("Listing request from chat {}: {}", msg.chat.id, url);

    let status = bot
        .send_message(msg.chat.id, "🔄 Looking for photos... Please wait ⏳")
        .await?;

    if let Err(e) = deliver_listing(&bot, &msg, &state, &url, site, status.id).await {
        error!("Failed to process {}: {}", url, e);
        if let Err(e) = bot.edit_message_text(msg.chat.id, status.id, FAILURE).await {
            warn!("Could not update status message: {}", e);
        }
    }
    Ok(())
}

async fn deliver_listing(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    url: &str,
    site: SiteVariant,
    status: MessageId,
) -> HandlerResult {
    let candidates = state.navigator.discover(url, site).await;
    if candidates.is_empty() {
        bot.edit_message_text(msg.chat.id, status, format!("❌ No photos found on {}", site))
            .await?;
        return Ok(());
    }

    bot.edit_message_text(
        msg.chat.id,
        status,
        format!("📷 Found {} photos on {}! Processing...", candidates.len(), site),
    )
    .await?;

    let urls: Vec<String> = candidates.into_iter().map(|c| c.url).collect();
    let sink = TelegramAlbumSink::new(bot.clone(), msg.chat.id).reply_to(msg.id);
    let delivered = state.pipeline.deliver(&urls, site, &sink).await;
    info!("Delivered {} of {} photos for {}", delivered, urls.len(), url);

    send_summary(bot, msg.chat.id, delivered, site).await;
    Ok(())
}
