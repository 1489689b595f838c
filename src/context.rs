//! Per-invocation handler context.
//!
//! A cheap clone handed to every handler: the update that triggered it, the
//! bot (for API access and re-entrant registration), and the extracted data
//! slice for commands and callbacks.

use std::sync::Arc;

use crate::api::{AnswerCallbackQueryParams, SendMessageParams};
use crate::bot::Bot;
use crate::error::{Error, Result};
use crate::types::{
    Animation, Audio, CallbackQuery, Chat, Contact, Dice, Document, Game, Invoice, Location,
    Message, PhotoSize, Sticker, SuccessfulPayment, Update, User, Venue, Video, VideoNote, Voice,
};

/// Everything a handler gets about the update it was invoked for.
#[derive(Clone)]
pub struct Context {
    bot: Bot,
    update: Arc<Update>,
    /// Command payload or callback payload, when the triggering key carried
    /// one.
    data: Option<String>,
}

impl Context {
    pub(crate) fn new(bot: Bot, update: Arc<Update>, data: Option<String>) -> Self {
        Self { bot, update, data }
    }

    /// The bot this context belongs to.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// The raw update.
    pub fn update(&self) -> &Update {
        &self.update
    }

    /// The message this update carries, whichever top-level field it
    /// arrived in (including the message a callback button hangs off).
    pub fn message(&self) -> Option<&Message> {
        self.update
            .message
            .as_ref()
            .or(self.update.edited_message.as_ref())
            .or(self.update.channel_post.as_ref())
            .or(self.update.edited_channel_post.as_ref())
            .or_else(|| self.update.callback_query.as_ref().and_then(|q| q.message.as_deref()))
    }

    /// The callback query, for callback updates.
    pub fn callback(&self) -> Option<&CallbackQuery> {
        self.update.callback_query.as_ref()
    }

    /// The user who caused this update.
    pub fn sender(&self) -> Option<&User> {
        if let Some(query) = &self.update.callback_query {
            return Some(&query.from);
        }
        if let Some(query) = &self.update.inline_query {
            return Some(&query.from);
        }
        if let Some(result) = &self.update.chosen_inline_result {
            return Some(&result.from);
        }
        if let Some(query) = &self.update.shipping_query {
            return Some(&query.from);
        }
        if let Some(query) = &self.update.pre_checkout_query {
            return Some(&query.from);
        }
        if let Some(answer) = &self.update.poll_answer {
            return answer.user.as_ref();
        }
        if let Some(member) = self.update.my_chat_member.as_ref().or(self.update.chat_member.as_ref()) {
            return Some(&member.from);
        }
        if let Some(request) = &self.update.chat_join_request {
            return Some(&request.from);
        }
        self.message().and_then(|m| m.from.as_ref())
    }

    /// The chat the update happened in.
    pub fn chat(&self) -> Option<&Chat> {
        if let Some(member) = self.update.my_chat_member.as_ref().or(self.update.chat_member.as_ref()) {
            return Some(&member.chat);
        }
        if let Some(request) = &self.update.chat_join_request {
            return Some(&request.chat);
        }
        self.message().map(|m| &m.chat)
    }

    /// Message text, falling back to the media caption.
    pub fn text(&self) -> Option<&str> {
        self.message().and_then(|m| m.text.as_deref().or(m.caption.as_deref()))
    }

    /// Command or callback payload, when present.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Whitespace-split command payload.
    pub fn args(&self) -> Vec<&str> {
        self.data.as_deref().map(|d| d.split_whitespace().collect()).unwrap_or_default()
    }

    /// For membership updates dispatched per user, the user in question.
    pub fn joined_user(&self) -> Option<&User> {
        self.message().and_then(|m| m.new_chat_members.as_ref()).and_then(|users| users.first())
    }

    pub fn photo(&self) -> Option<&[PhotoSize]> {
        self.message().and_then(|m| m.photo.as_deref())
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.message().and_then(|m| m.voice.as_ref())
    }

    pub fn audio(&self) -> Option<&Audio> {
        self.message().and_then(|m| m.audio.as_ref())
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.message().and_then(|m| m.animation.as_ref())
    }

    pub fn document(&self) -> Option<&Document> {
        self.message().and_then(|m| m.document.as_ref())
    }

    pub fn sticker(&self) -> Option<&Sticker> {
        self.message().and_then(|m| m.sticker.as_ref())
    }

    pub fn video(&self) -> Option<&Video> {
        self.message().and_then(|m| m.video.as_ref())
    }

    pub fn video_note(&self) -> Option<&VideoNote> {
        self.message().and_then(|m| m.video_note.as_ref())
    }

    pub fn contact(&self) -> Option<&Contact> {
        self.message().and_then(|m| m.contact.as_ref())
    }

    pub fn location(&self) -> Option<&Location> {
        self.message().and_then(|m| m.location.as_ref())
    }

    pub fn venue(&self) -> Option<&Venue> {
        self.message().and_then(|m| m.venue.as_ref())
    }

    pub fn game(&self) -> Option<&Game> {
        self.message().and_then(|m| m.game.as_ref())
    }

    pub fn dice(&self) -> Option<&Dice> {
        self.message().and_then(|m| m.dice.as_ref())
    }

    pub fn invoice(&self) -> Option<&Invoice> {
        self.message().and_then(|m| m.invoice.as_ref())
    }

    pub fn payment(&self) -> Option<&SuccessfulPayment> {
        self.message().and_then(|m| m.successful_payment.as_ref())
    }

    /// Sends a text message to the chat this update came from.
    pub async fn reply(&self, text: impl Into<String>) -> Result<Message> {
        let chat = self.chat().ok_or(Error::MissingChat)?;
        let message = self
            .bot
            .api()
            .send_message(&SendMessageParams {
                chat_id: chat.id,
                text: text.into(),
                reply_to_message_id: None,
            })
            .await
            .map_err(Error::Api)?;
        Ok(message)
    }

    /// Acknowledges the callback query this update carries.
    pub async fn answer(&self, text: Option<String>, show_alert: bool) -> Result<()> {
        let query = self.callback().ok_or(Error::NotCallback)?;
        self.bot
            .api()
            .answer_callback_query(&AnswerCallbackQueryParams {
                callback_query_id: query.id.clone(),
                text,
                show_alert,
            })
            .await
            .map_err(Error::Api)?;
        Ok(())
    }
}
