//! Centralized error types for the crate.
//!
//! Three layers, matching how errors propagate:
//! - [`ApiError`] — outbound Bot API calls (transport or Telegram-level).
//! - [`DispatchError`] — per-update classification outcomes; returned by
//!   [`crate::Bot::process_update`] so callers driving the loop manually can
//!   branch on them. Inside the owned polling loop they are logged and the
//!   loop moves on.
//! - [`Error`] — everything a public entry point can return.

use std::time::Duration;

use thiserror::Error;

use crate::event::Event;

/// Errors from the outbound Bot API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Telegram answered with `ok: false`.
    #[error("telegram api error {code}: {description}")]
    Telegram {
        code: i32,
        description: String,
        /// Flood-control hint from the `parameters` object, when present.
        retry_after: Option<Duration>,
    },

    /// HTTP transport errors, including request timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `ok: true` but no `result` payload.
    #[error("api response carried no result")]
    MissingResult,
}

/// Per-update classification and routing outcomes.
///
/// Every variant names the exact condition rather than collapsing into a
/// generic "not found", so callers can tell an unregistered handler apart
/// from a command meant for a different bot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Classification succeeded but no handler is registered for the kind.
    #[error("no handler registered for {0} updates")]
    NoHandler(Event),

    /// A multi-user membership update found a handler, but only some of the
    /// per-user invocations succeeded.
    #[error("{handled} of {total} joined users handled")]
    PartiallyHandled { handled: usize, total: usize },

    /// Message text begins with a reserved control byte and is rejected
    /// before classification.
    #[error("message text carries a reserved control prefix")]
    MaliciousInput,

    /// A command addressed to another bot's username; explicitly ignored.
    #[error("command addressed to foreign bot @{target}")]
    ForeignBotCommand { target: String },

    /// None of the known payload fields are populated.
    #[error("update {0} has no recognizable payload")]
    UnknownUpdate(i64),
}

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Outbound API call failures.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Classification/routing failures from manual dispatch.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// `start_polling`/`start_webhook` called while already running.
    #[error("bot is already running")]
    AlreadyRunning,

    /// Registration key is not a well-formed command literal.
    #[error("invalid command literal: {0:?}")]
    InvalidCommand(String),

    /// Registration key is not a usable callback-unique token.
    #[error("invalid callback unique: {0:?}")]
    InvalidCallbackUnique(String),

    /// `Settings::from_env` found no token.
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingToken,

    /// URL parsing errors.
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// IO errors (webhook listener bind).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `Context::reply` on an update that carries no chat.
    #[error("update has no chat to reply to")]
    MissingChat,

    /// `Context::answer` on an update that is not a callback query.
    #[error("update is not a callback query")]
    NotCallback,
}

/// Type alias for Result with the crate error.
pub type Result<T> = std::result::Result<T, Error>;
