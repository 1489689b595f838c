//! Bot, poller, and webhook configuration.
//!
//! Plain builder structs with chained `#[must_use]` setters; no global
//! state. `Settings::from_env` covers the common deployment shape where the
//! token and an optional local Bot API server URL come from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::{Error, Result};
use crate::types::{AllowedUpdate, User};

const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// How handlers are invoked by the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Handler runs on the dispatch task; the next update waits for it.
    Sync,
    /// Handler is spawned onto a tracked task; dispatch continues
    /// immediately. Completion order across updates is not guaranteed.
    #[default]
    Concurrent,
}

/// Top-level bot settings.
#[derive(Clone)]
pub struct Settings {
    pub(crate) token: SecretString,
    pub(crate) api_url: Url,
    pub(crate) mode: DispatchMode,
    /// How long `stop` waits for in-flight concurrent handlers. `None`
    /// means don't wait at all.
    pub(crate) handler_join_timeout: Option<Duration>,
    /// Preset bot identity. Skips the startup `getMe` call; intended for
    /// tests and for driving `process_update` manually.
    pub(crate) me: Option<User>,
    pub(crate) poller: PollerConfig,
    /// Timeout for ordinary (non-long-poll) API calls.
    pub(crate) http_timeout: Duration,
}

impl Settings {
    /// Creates settings with the given bot token and defaults everywhere
    /// else.
    pub fn new(token: impl Into<String>) -> Self {
        #[allow(clippy::unwrap_used)] // the literal is a valid URL
        let api_url = Url::parse(DEFAULT_API_URL).unwrap();
        Self {
            token: SecretString::from(token.into()),
            api_url,
            mode: DispatchMode::default(),
            handler_join_timeout: Some(Duration::from_secs(5)),
            me: None,
            poller: PollerConfig::default(),
            http_timeout: Duration::from_secs(30),
        }
    }

    /// Reads `TELEGRAM_BOT_TOKEN` (required) and `BOT_API_URL` (optional,
    /// for local Bot API servers).
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN").map_err(|_| Error::MissingToken)?;
        let mut settings = Self::new(token);
        if let Ok(api_url) = std::env::var("BOT_API_URL") {
            tracing::info!(url = %api_url, "using custom Bot API URL");
            settings.api_url = Url::parse(&api_url)?;
        }
        Ok(settings)
    }

    /// Overrides the Bot API base URL.
    #[must_use]
    pub fn api_url(mut self, url: Url) -> Self {
        self.api_url = url;
        self
    }

    /// Sets the handler invocation mode.
    #[must_use]
    pub fn mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets how long `stop` waits for in-flight concurrent handlers.
    #[must_use]
    pub fn handler_join_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_join_timeout = timeout;
        self
    }

    /// Presets the bot identity, skipping the startup `getMe` call.
    #[must_use]
    pub fn me(mut self, me: User) -> Self {
        self.me = Some(me);
        self
    }

    /// Replaces the long-poll configuration.
    #[must_use]
    pub fn poller(mut self, poller: PollerConfig) -> Self {
        self.poller = poller;
        self
    }

    /// Sets the timeout for ordinary API calls.
    #[must_use]
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}

/// Long-poll fetch configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Max updates per batch (Telegram caps this at 100).
    pub limit: Option<u8>,
    /// Long-poll wait passed to `getUpdates`, in whole seconds.
    pub timeout: Duration,
    /// Update kinds to receive; `None` keeps Telegram's default set.
    pub allowed_updates: Option<Vec<AllowedUpdate>>,
    /// Backoff between failed fetches.
    pub retry: RetryPolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            limit: None,
            timeout: Duration::from_secs(10),
            allowed_updates: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl PollerConfig {
    /// Creates a poller config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch size limit.
    #[must_use]
    pub fn limit(mut self, limit: u8) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the long-poll wait duration.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restricts the update kinds delivered by the server.
    #[must_use]
    pub fn allowed_updates(mut self, allowed: Vec<AllowedUpdate>) -> Self {
        self.allowed_updates = Some(allowed);
        self
    }

    /// Replaces the fetch retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Exponential backoff with jitter for failed fetches.
///
/// The poller never gives up; the policy only shapes the delay between
/// attempts so a failing network is not hammered in a tight loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap for the computed delay.
    pub max_delay: Duration,
    /// Multiplier applied per consecutive failure.
    pub backoff_multiplier: f64,
    /// Whether to add up to 25% random jitter.
    pub add_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Disables jitter.
    #[must_use]
    pub fn no_jitter(mut self) -> Self {
        self.add_jitter = false;
        self
    }

    /// Calculates the delay for a given consecutive-failure count.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay.as_secs_f64());

        let final_delay = if self.add_jitter {
            // Up to 25% jitter so restarting fleets don't sync up.
            let jitter = rand::random::<f64>() * 0.25 * capped_delay;
            capped_delay + jitter
        } else {
            capped_delay
        };

        Duration::from_secs_f64(final_delay)
    }
}

/// Webhook listener configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Public HTTPS URL registered with Telegram. Its path is also the
    /// local route the listener serves.
    pub url: Url,
    /// Local address to bind.
    pub listen: SocketAddr,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value.
    pub secret_token: Option<String>,
    /// Ask Telegram to discard the queued backlog on registration.
    pub drop_pending_updates: bool,
    /// Call `deleteWebhook` when the bot stops.
    pub delete_on_stop: bool,
    /// Max simultaneous connections Telegram will open.
    pub max_connections: Option<u16>,
    /// Update kinds to receive; `None` keeps Telegram's default set.
    pub allowed_updates: Option<Vec<AllowedUpdate>>,
}

impl WebhookConfig {
    /// Creates a webhook config for the given public URL and bind address.
    pub fn new(url: Url, listen: SocketAddr) -> Self {
        Self {
            url,
            listen,
            secret_token: None,
            drop_pending_updates: false,
            delete_on_stop: false,
            max_connections: None,
            allowed_updates: None,
        }
    }

    /// Requires the given secret token on inbound requests.
    #[must_use]
    pub fn secret_token(mut self, token: impl Into<String>) -> Self {
        self.secret_token = Some(token.into());
        self
    }

    /// Discards the queued backlog on registration.
    #[must_use]
    pub fn drop_pending_updates(mut self) -> Self {
        self.drop_pending_updates = true;
        self
    }

    /// Deregisters the webhook when the bot stops.
    #[must_use]
    pub fn delete_on_stop(mut self) -> Self {
        self.delete_on_stop = true;
        self
    }

    /// Limits simultaneous connections from Telegram.
    #[must_use]
    pub fn max_connections(mut self, max: u16) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Restricts the update kinds delivered by the server.
    #[must_use]
    pub fn allowed_updates(mut self, allowed: Vec<AllowedUpdate>) -> Self {
        self.allowed_updates = Some(allowed);
        self
    }

    /// Local route path, derived from the public URL. `Url` normalizes an
    /// absent path to `"/"` for http(s) URLs, so this is never empty.
    pub(crate) fn route_path(&self) -> String {
        self.url.path().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_retry_delay_grows_exponentially() {
        let policy = RetryPolicy::new()
            .initial_delay(Duration::from_secs(1))
            .backoff_multiplier(2.0)
            .no_jitter();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let policy = RetryPolicy::new()
            .initial_delay(Duration::from_secs(10))
            .max_delay(Duration::from_secs(30))
            .no_jitter();

        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(30));
    }

    #[test]
    fn test_retry_jitter_stays_within_bounds() {
        let policy = RetryPolicy::new().initial_delay(Duration::from_secs(4)).max_delay(Duration::from_secs(4));

        for attempt in 0..20 {
            let delay = policy.delay_for_attempt(attempt);
            assert!(delay >= Duration::from_secs(4));
            assert!(delay <= Duration::from_secs(5));
        }
    }

    #[test]
    fn test_webhook_route_path_follows_url() {
        let config = WebhookConfig::new(
            Url::parse("https://bot.example.com/tg/hook").unwrap(),
            "127.0.0.1:8443".parse().unwrap(),
        );
        assert_eq!(config.route_path(), "/tg/hook");
    }

    #[test]
    fn test_webhook_route_path_for_bare_host_is_root() {
        let config = WebhookConfig::new(
            Url::parse("https://bot.example.com").unwrap(),
            "127.0.0.1:8443".parse().unwrap(),
        );
        assert_eq!(config.route_path(), "/");
    }

    #[test]
    fn test_settings_from_env_requires_token() {
        // Only assert the error path; the success path would race other
        // tests over process-global env vars.
        if std::env::var("TELEGRAM_BOT_TOKEN").is_err() {
            assert!(matches!(Settings::from_env(), Err(Error::MissingToken)));
        }
    }
}
