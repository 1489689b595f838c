//! Telegram Bot API wire types.
//!
//! Only the objects the dispatch core inspects are modeled; fields that
//! never influence classification or context accessors are omitted. All
//! inbound types derive [`Default`] so tests can build sparse payloads with
//! struct-update syntax.

use serde::{Deserialize, Serialize};

/// One event delivered by Telegram. At most one payload field is populated
/// per instance; `update_id` values within a polling session are
/// non-decreasing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub edited_message: Option<Message>,
    pub channel_post: Option<Message>,
    pub edited_channel_post: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
    pub inline_query: Option<InlineQuery>,
    pub chosen_inline_result: Option<ChosenInlineResult>,
    pub shipping_query: Option<ShippingQuery>,
    pub pre_checkout_query: Option<PreCheckoutQuery>,
    pub poll: Option<Poll>,
    pub poll_answer: Option<PollAnswer>,
    pub my_chat_member: Option<ChatMemberUpdated>,
    pub chat_member: Option<ChatMemberUpdated>,
    pub chat_join_request: Option<ChatJoinRequest>,
}

/// Telegram Message object, trimmed to the classification surface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub date: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub reply_to_message: Option<Box<Message>>,
    pub pinned_message: Option<Box<Message>>,

    // Media payloads, in classification order.
    pub photo: Option<Vec<PhotoSize>>,
    pub voice: Option<Voice>,
    pub audio: Option<Audio>,
    pub animation: Option<Animation>,
    pub document: Option<Document>,
    pub sticker: Option<Sticker>,
    pub video: Option<Video>,
    pub video_note: Option<VideoNote>,

    pub contact: Option<Contact>,
    pub location: Option<Location>,
    pub venue: Option<Venue>,
    pub game: Option<Game>,
    pub dice: Option<Dice>,
    pub invoice: Option<Invoice>,
    pub successful_payment: Option<SuccessfulPayment>,

    // Membership and chat service events.
    pub new_chat_members: Option<Vec<User>>,
    pub left_chat_member: Option<User>,
    pub new_chat_title: Option<String>,
    pub new_chat_photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub delete_chat_photo: bool,
    #[serde(default)]
    pub group_chat_created: bool,
    #[serde(default)]
    pub supergroup_chat_created: bool,
    #[serde(default)]
    pub channel_chat_created: bool,
    pub migrate_to_chat_id: Option<i64>,
    pub migrate_from_chat_id: Option<i64>,

    pub video_chat_scheduled: Option<VideoChatScheduled>,
    pub video_chat_started: Option<VideoChatStarted>,
    pub video_chat_ended: Option<VideoChatEnded>,
    pub video_chat_participants_invited: Option<VideoChatParticipantsInvited>,
    pub web_app_data: Option<WebAppData>,
    pub proximity_alert_triggered: Option<ProximityAlertTriggered>,
    pub message_auto_delete_timer_changed: Option<MessageAutoDeleteTimerChanged>,
}

/// Telegram User object.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

/// Telegram Chat object.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: String,
    pub title: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Photo size in a photo array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: i32,
    pub height: i32,
    pub file_size: Option<i64>,
}

/// Voice message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Voice {
    pub file_id: String,
    pub file_unique_id: String,
    pub duration: i32,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
}

/// Audio attachment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Audio {
    pub file_id: String,
    pub file_unique_id: String,
    pub duration: i32,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
}

/// Animation (GIF or short soundless video).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Animation {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: i32,
    pub height: i32,
    pub duration: i32,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
}

/// Document attachment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_unique_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
}

/// Sticker attachment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sticker {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: i32,
    pub height: i32,
    pub emoji: Option<String>,
    pub set_name: Option<String>,
}

/// Video attachment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Video {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: i32,
    pub height: i32,
    pub duration: i32,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
}

/// Round video message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoNote {
    pub file_id: String,
    pub file_unique_id: String,
    pub length: i32,
    pub duration: i32,
    pub file_size: Option<i64>,
}

/// Shared contact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Contact {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub user_id: Option<i64>,
}

/// Shared location.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

/// Venue (location with a title).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Venue {
    pub location: Location,
    pub title: String,
    pub address: String,
}

/// Game message payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Game {
    pub title: String,
    pub description: String,
}

/// Dice roll.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dice {
    pub emoji: String,
    pub value: i32,
}

/// Invoice for a payment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Invoice {
    pub title: String,
    pub description: String,
    pub start_parameter: String,
    pub currency: String,
    pub total_amount: i64,
}

/// Completed payment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuccessfulPayment {
    pub currency: String,
    pub total_amount: i64,
    pub invoice_payload: String,
}

/// Callback query from an inline keyboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Box<Message>>,
    pub inline_message_id: Option<String>,
    #[serde(default)]
    pub chat_instance: String,
    pub data: Option<String>,
}

/// Incoming inline query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    pub query: String,
    pub offset: String,
}

/// Inline result the user picked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChosenInlineResult {
    pub result_id: String,
    pub from: User,
    pub query: String,
    pub inline_message_id: Option<String>,
}

/// Shipping query during checkout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingQuery {
    pub id: String,
    pub from: User,
    pub invoice_payload: String,
    pub shipping_address: ShippingAddress,
}

/// Shipping address in a shipping query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingAddress {
    pub country_code: String,
    pub state: String,
    pub city: String,
    pub street_line1: String,
    pub street_line2: String,
    pub post_code: String,
}

/// Pre-checkout confirmation query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreCheckoutQuery {
    pub id: String,
    pub from: User,
    pub currency: String,
    pub total_amount: i64,
    pub invoice_payload: String,
}

/// Poll state update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<PollOption>,
    pub total_voter_count: i32,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// One answer option in a poll.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollOption {
    pub text: String,
    pub voter_count: i32,
}

/// A user's changed vote in a non-anonymous poll.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollAnswer {
    pub poll_id: String,
    pub user: Option<User>,
    #[serde(default)]
    pub option_ids: Vec<i32>,
}

/// Changed member status in a chat (`my_chat_member` / `chat_member`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: User,
    pub date: i64,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
}

/// A chat member with their status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMember {
    #[serde(default)]
    pub status: String,
    pub user: User,
}

/// Request to join a chat.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatJoinRequest {
    pub chat: Chat,
    pub from: User,
    pub user_chat_id: Option<i64>,
    pub date: i64,
    pub bio: Option<String>,
}

/// Scheduled video chat announcement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoChatScheduled {
    pub start_date: i64,
}

/// Video chat started (no fields on the wire).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoChatStarted {}

/// Video chat ended.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoChatEnded {
    pub duration: i64,
}

/// New participants invited to a video chat.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoChatParticipantsInvited {
    #[serde(default)]
    pub users: Vec<User>,
}

/// Data sent back from a web app button.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebAppData {
    pub data: String,
    pub button_text: String,
}

/// Proximity alert while sharing live location.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProximityAlertTriggered {
    pub traveler: User,
    pub watcher: User,
    pub distance: i64,
}

/// Auto-delete timer change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageAutoDeleteTimerChanged {
    pub message_auto_delete_time: i64,
}

/// Update kinds accepted by the `allowed_updates` fetch filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedUpdate {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    CallbackQuery,
    InlineQuery,
    ChosenInlineResult,
    ShippingQuery,
    PreCheckoutQuery,
    Poll,
    PollAnswer,
    MyChatMember,
    ChatMember,
    ChatJoinRequest,
}
