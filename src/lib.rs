//! Telegram Bot API client focused on update dispatch.
//!
//! The crate covers the receiving half of a bot: fetching updates (long
//! polling or a webhook listener), classifying each update into exactly one
//! event kind, and routing it to a registered handler.
//!
//! ```no_run
//! use telepoll::{Bot, Event, Settings};
//!
//! #[tokio::main]
//! async fn main() -> telepoll::Result<()> {
//!     let bot = Bot::connect(Settings::from_env()?).await?;
//!
//!     bot.command("/start", |ctx| async move {
//!         ctx.reply("hello!").await?;
//!         Ok(())
//!     })?;
//!     bot.on(Event::Text, |ctx| async move {
//!         tracing::info!(text = ctx.text().unwrap_or_default(), "message");
//!         Ok(())
//!     })?;
//!
//!     bot.start_polling().await?;
//!     tokio::signal::ctrl_c().await?;
//!     bot.stop().await;
//!     Ok(())
//! }
//! ```

pub mod api;
mod bot;
pub mod config;
mod context;
mod dispatch;
pub mod error;
mod event;
mod poller;
mod registry;
pub mod types;
mod webhook;

pub use bot::Bot;
pub use config::{DispatchMode, PollerConfig, RetryPolicy, Settings, WebhookConfig};
pub use context::Context;
pub use error::{ApiError, DispatchError, Error, Result};
pub use event::{CALLBACK_MARKER, COMMAND_PATTERN, ENDPOINT_MARKER, Event, On, callback_data};
