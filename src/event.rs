//! Event kinds and handler registration keys.
//!
//! Every update is classified into exactly one [`Event`]. Registry keys live
//! in three disjoint namespaces:
//! - command literals (`"/start"`), matched against [`COMMAND_PATTERN`];
//! - symbolic endpoints, one per [`Event`] variant, prefixed with the
//!   reserved [`ENDPOINT_MARKER`] control byte so user text can never
//!   collide with them;
//! - callback-unique tokens, prefixed with [`CALLBACK_MARKER`].

use std::fmt;

use lazy_regex::{Lazy, Regex, lazy_regex, regex_is_match};

/// Reserved prefix for symbolic endpoint keys. A message whose text starts
/// with this byte is rejected as malicious before classification.
pub const ENDPOINT_MARKER: char = '\u{7}';

/// Reserved prefix for callback data carrying a unique token
/// (`"\u{c}<unique>|<payload>"`).
pub const CALLBACK_MARKER: char = '\u{c}';

/// Command text pattern: `/name`, optional `@target_bot`, optional payload.
///
/// Group 1 is the command with its slash, group 3 the target bot username,
/// group 5 the payload.
pub static COMMAND_PATTERN: Lazy<Regex> = lazy_regex!(r"(?s)^(/\w+)(@(\w+))?(\s|$)(.+)?");

/// The classification result for an update: which single payload field (or
/// message sub-event) it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    // Message sub-events.
    Text,
    Pinned,
    Photo,
    Voice,
    Audio,
    Animation,
    Document,
    Sticker,
    Video,
    VideoNote,
    /// Generic fallback for any media kind without its own handler.
    Media,
    Contact,
    Location,
    Venue,
    Game,
    Dice,
    Invoice,
    Payment,
    AddedToGroup,
    UserJoined,
    UserLeft,
    NewGroupTitle,
    NewGroupPhoto,
    GroupPhotoDeleted,
    GroupCreated,
    SupergroupCreated,
    ChannelCreated,
    Migration,
    VideoChatScheduled,
    VideoChatStarted,
    VideoChatEnded,
    VideoChatParticipants,
    WebApp,
    ProximityAlert,
    AutoDeleteTimer,

    // Top-level update kinds.
    Edited,
    ChannelPost,
    EditedChannelPost,
    Callback,
    InlineQuery,
    InlineResult,
    ShippingQuery,
    CheckoutQuery,
    Poll,
    PollAnswer,
    MyChatMember,
    ChatMember,
    ChatJoinRequest,
}

impl Event {
    /// Short lowercase name, used in error messages and logs.
    pub fn name(self) -> &'static str {
        match self {
            Event::Text => "text",
            Event::Pinned => "pinned",
            Event::Photo => "photo",
            Event::Voice => "voice",
            Event::Audio => "audio",
            Event::Animation => "animation",
            Event::Document => "document",
            Event::Sticker => "sticker",
            Event::Video => "video",
            Event::VideoNote => "video_note",
            Event::Media => "media",
            Event::Contact => "contact",
            Event::Location => "location",
            Event::Venue => "venue",
            Event::Game => "game",
            Event::Dice => "dice",
            Event::Invoice => "invoice",
            Event::Payment => "payment",
            Event::AddedToGroup => "added_to_group",
            Event::UserJoined => "user_joined",
            Event::UserLeft => "user_left",
            Event::NewGroupTitle => "new_chat_title",
            Event::NewGroupPhoto => "new_chat_photo",
            Event::GroupPhotoDeleted => "chat_photo_deleted",
            Event::GroupCreated => "group_created",
            Event::SupergroupCreated => "supergroup_created",
            Event::ChannelCreated => "channel_created",
            Event::Migration => "migration",
            Event::VideoChatScheduled => "video_chat_scheduled",
            Event::VideoChatStarted => "video_chat_started",
            Event::VideoChatEnded => "video_chat_ended",
            Event::VideoChatParticipants => "video_chat_participants",
            Event::WebApp => "web_app",
            Event::ProximityAlert => "proximity_alert",
            Event::AutoDeleteTimer => "auto_delete_timer",
            Event::Edited => "edited",
            Event::ChannelPost => "channel_post",
            Event::EditedChannelPost => "edited_channel_post",
            Event::Callback => "callback",
            Event::InlineQuery => "inline_query",
            Event::InlineResult => "inline_result",
            Event::ShippingQuery => "shipping_query",
            Event::CheckoutQuery => "checkout_query",
            Event::Poll => "poll",
            Event::PollAnswer => "poll_answer",
            Event::MyChatMember => "my_chat_member",
            Event::ChatMember => "chat_member",
            Event::ChatJoinRequest => "chat_join_request",
        }
    }

    /// Registry key for this event: the endpoint marker plus the name.
    pub(crate) fn key(self) -> String {
        format!("{}{}", ENDPOINT_MARKER, self.name())
    }

    /// For specific media kinds, the generic event tried when no dedicated
    /// handler is registered.
    pub(crate) fn fallback(self) -> Option<Event> {
        match self {
            Event::Photo
            | Event::Voice
            | Event::Audio
            | Event::Animation
            | Event::Document
            | Event::Sticker
            | Event::Video
            | Event::VideoNote => Some(Event::Media),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A handler registration key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum On {
    /// Literal slash-command, e.g. `"/start"`.
    Command(String),
    /// Symbolic endpoint for a non-command event kind.
    Event(Event),
    /// Callback-unique token (registered without the marker prefix).
    Callback(String),
}

impl From<Event> for On {
    fn from(event: Event) -> Self {
        On::Event(event)
    }
}

impl From<&str> for On {
    fn from(command: &str) -> Self {
        On::Command(command.to_owned())
    }
}

impl On {
    /// Validates the key and renders it into its registry string form.
    pub(crate) fn into_key(self) -> Result<String, crate::Error> {
        match self {
            On::Command(command) => {
                if regex_is_match!(r"^/\w+$", &command) {
                    Ok(command)
                } else {
                    Err(crate::Error::InvalidCommand(command))
                }
            }
            On::Event(event) => Ok(event.key()),
            On::Callback(unique) => {
                if unique.is_empty() || unique.contains('|') || unique.contains(char::is_whitespace) {
                    Err(crate::Error::InvalidCallbackUnique(unique))
                } else {
                    Ok(callback_key(&unique))
                }
            }
        }
    }
}

/// Registry key for a callback-unique token.
pub(crate) fn callback_key(unique: &str) -> String {
    format!("{CALLBACK_MARKER}{unique}")
}

/// Renders `callback_data` for an inline keyboard button so the resulting
/// callback query routes to the handler registered under `unique`.
pub fn callback_data(unique: &str, payload: Option<&str>) -> String {
    match payload {
        Some(payload) => format!("{CALLBACK_MARKER}{unique}|{payload}"),
        None => format!("{CALLBACK_MARKER}{unique}"),
    }
}
