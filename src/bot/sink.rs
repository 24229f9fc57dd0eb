//! Album delivery to a Telegram chat.

use anyhow::Context;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, InputMedia, InputMediaPhoto, MessageId, ReplyParameters};

use crate::services::{AlbumPhoto, AlbumSink};

/// Sends albums as media groups replying to the listing message.
pub struct TelegramAlbumSink {
    bot: Bot,
    chat_id: ChatId,
    reply_to: Option<MessageId>,
}

impl TelegramAlbumSink {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self {
            bot,
            chat_id,
            reply_to: None,
        }
    }

    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

fn photo_file(index: usize, photo: AlbumPhoto) -> InputFile {
    InputFile::memory(photo.bytes).file_name(format!("photo_{}.jpg", index + 1))
}

#[async_trait]
impl AlbumSink for TelegramAlbumSink {
    async fn send_album(&self, photos: Vec<AlbumPhoto>) -> anyhow::Result<()> {
        // Media groups need at least two items.
        if photos.len() == 1 {
            let mut photos = photos;
            let file = photo_file(0, photos.remove(0));
            let mut request = self.bot.send_photo(self.chat_id, file);
            if let Some(reply_to) = self.reply_to {
                request = request.reply_parameters(ReplyParameters::new(reply_to));
            }
            request.await.context("sendPhoto failed")?;
            return Ok(());
        }

        let media: Vec<InputMedia> = photos
            .into_iter()
            .enumerate()
            .map(|(i, photo)| InputMedia::Photo(InputMediaPhoto::new(photo_file(i, photo))))
            .collect();

        let mut request = self.bot.send_media_group(self.chat_id, media);
        if let Some(reply_to) = self.reply_to {
            request = request.reply_parameters(ReplyParameters::new(reply_to));
        }
        request.await.context("sendMediaGroup failed")?;
        Ok(())
    }
}
