//! Update classification.
//!
//! [`classify`] maps one update to exactly one outcome, walking the payload
//! fields in a fixed order so the same update always routes the same way.
//! Within a message, the order is: pinned, text (command before plain text),
//! media kinds, attachments, membership and service events. Registry lookup
//! and handler invocation live in [`crate::bot`]; this module is pure.

use crate::error::DispatchError;
use crate::event::{CALLBACK_MARKER, COMMAND_PATTERN, ENDPOINT_MARKER, Event};
use crate::types::{Message, Update, User};

/// How an update should be routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Classification {
    /// A command addressed to this bot (or to nobody in particular).
    Command {
        /// The command literal with its slash, e.g. `"/start"`.
        key: String,
        payload: Option<String>,
    },
    /// Callback data carrying a unique token.
    CallbackUnique { unique: String, payload: Option<String> },
    /// An ordinary single-handler event.
    Single(Event),
    /// `new_chat_members` not including the bot itself; dispatched once per
    /// joined user.
    UsersJoined,
}

/// Classifies one update. `me` is the bot's own identity, needed to tell
/// self-addressed commands and self-joins apart from everyone else's.
pub(crate) fn classify(update: &Update, me: &User) -> Result<Classification, DispatchError> {
    if let Some(message) = &update.message {
        return classify_message(message, me, update.update_id);
    }
    if update.edited_message.is_some() {
        return Ok(Classification::Single(Event::Edited));
    }
    if let Some(post) = &update.channel_post {
        if post.pinned_message.is_some() {
            return Ok(Classification::Single(Event::Pinned));
        }
        return Ok(Classification::Single(Event::ChannelPost));
    }
    if update.edited_channel_post.is_some() {
        return Ok(Classification::Single(Event::EditedChannelPost));
    }
    if let Some(query) = &update.callback_query {
        if let Some(data) = &query.data {
            if let Some(rest) = data.strip_prefix(CALLBACK_MARKER) {
                let (unique, payload) = match rest.split_once('|') {
                    Some((unique, payload)) => (unique, Some(payload.to_owned())),
                    None => (rest, None),
                };
                return Ok(Classification::CallbackUnique { unique: unique.to_owned(), payload });
            }
        }
        return Ok(Classification::Single(Event::Callback));
    }
    if update.inline_query.is_some() {
        return Ok(Classification::Single(Event::InlineQuery));
    }
    if update.chosen_inline_result.is_some() {
        return Ok(Classification::Single(Event::InlineResult));
    }
    if update.shipping_query.is_some() {
        return Ok(Classification::Single(Event::ShippingQuery));
    }
    if update.pre_checkout_query.is_some() {
        return Ok(Classification::Single(Event::CheckoutQuery));
    }
    if update.poll.is_some() {
        return Ok(Classification::Single(Event::Poll));
    }
    if update.poll_answer.is_some() {
        return Ok(Classification::Single(Event::PollAnswer));
    }
    if update.my_chat_member.is_some() {
        return Ok(Classification::Single(Event::MyChatMember));
    }
    if update.chat_member.is_some() {
        return Ok(Classification::Single(Event::ChatMember));
    }
    if update.chat_join_request.is_some() {
        return Ok(Classification::Single(Event::ChatJoinRequest));
    }
    Err(DispatchError::UnknownUpdate(update.update_id))
}

fn classify_message(
    message: &Message,
    me: &User,
    update_id: i64,
) -> Result<Classification, DispatchError> {
    if message.pinned_message.is_some() {
        return Ok(Classification::Single(Event::Pinned));
    }

    if let Some(text) = &message.text {
        if text.starts_with(ENDPOINT_MARKER) {
            return Err(DispatchError::MaliciousInput);
        }
        if let Some(caps) = COMMAND_PATTERN.captures(text) {
            if let Some(target) = caps.get(3) {
                let addressed_to_me = me
                    .username
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(target.as_str()));
                if !addressed_to_me {
                    return Err(DispatchError::ForeignBotCommand {
                        target: target.as_str().to_owned(),
                    });
                }
            }
            return Ok(Classification::Command {
                key: caps[1].to_owned(),
                payload: caps.get(5).map(|p| p.as_str().to_owned()),
            });
        }
        return Ok(Classification::Single(Event::Text));
    }

    // Media kinds, most specific first.
    if message.photo.is_some() {
        return Ok(Classification::Single(Event::Photo));
    }
    if message.voice.is_some() {
        return Ok(Classification::Single(Event::Voice));
    }
    if message.audio.is_some() {
        return Ok(Classification::Single(Event::Audio));
    }
    if message.animation.is_some() {
        return Ok(Classification::Single(Event::Animation));
    }
    if message.document.is_some() {
        return Ok(Classification::Single(Event::Document));
    }
    if message.sticker.is_some() {
        return Ok(Classification::Single(Event::Sticker));
    }
    if message.video.is_some() {
        return Ok(Classification::Single(Event::Video));
    }
    if message.video_note.is_some() {
        return Ok(Classification::Single(Event::VideoNote));
    }

    if message.contact.is_some() {
        return Ok(Classification::Single(Event::Contact));
    }
    if message.location.is_some() {
        return Ok(Classification::Single(Event::Location));
    }
    if message.venue.is_some() {
        return Ok(Classification::Single(Event::Venue));
    }
    if message.game.is_some() {
        return Ok(Classification::Single(Event::Game));
    }
    if message.dice.is_some() {
        return Ok(Classification::Single(Event::Dice));
    }
    if message.invoice.is_some() {
        return Ok(Classification::Single(Event::Invoice));
    }
    if message.successful_payment.is_some() {
        return Ok(Classification::Single(Event::Payment));
    }

    if let Some(joined) = &message.new_chat_members {
        if joined.iter().any(|user| user.id == me.id) {
            return Ok(Classification::Single(Event::AddedToGroup));
        }
        return Ok(Classification::UsersJoined);
    }
    if message.left_chat_member.is_some() {
        return Ok(Classification::Single(Event::UserLeft));
    }
    if message.new_chat_title.is_some() {
        return Ok(Classification::Single(Event::NewGroupTitle));
    }
    if message.new_chat_photo.is_some() {
        return Ok(Classification::Single(Event::NewGroupPhoto));
    }
    if message.delete_chat_photo {
        return Ok(Classification::Single(Event::GroupPhotoDeleted));
    }
    if message.group_chat_created {
        return Ok(Classification::Single(Event::GroupCreated));
    }
    if message.supergroup_chat_created {
        return Ok(Classification::Single(Event::SupergroupCreated));
    }
    if message.channel_chat_created {
        return Ok(Classification::Single(Event::ChannelCreated));
    }
    if message.migrate_to_chat_id.is_some() || message.migrate_from_chat_id.is_some() {
        return Ok(Classification::Single(Event::Migration));
    }
    if message.video_chat_scheduled.is_some() {
        return Ok(Classification::Single(Event::VideoChatScheduled));
    }
    if message.video_chat_started.is_some() {
        return Ok(Classification::Single(Event::VideoChatStarted));
    }
    if message.video_chat_ended.is_some() {
        return Ok(Classification::Single(Event::VideoChatEnded));
    }
    if message.video_chat_participants_invited.is_some() {
        return Ok(Classification::Single(Event::VideoChatParticipants));
    }
    if message.web_app_data.is_some() {
        return Ok(Classification::Single(Event::WebApp));
    }
    if message.proximity_alert_triggered.is_some() {
        return Ok(Classification::Single(Event::ProximityAlert));
    }
    if message.message_auto_delete_timer_changed.is_some() {
        return Ok(Classification::Single(Event::AutoDeleteTimer));
    }

    Err(DispatchError::UnknownUpdate(update_id))
}
