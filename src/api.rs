//! Outbound Bot API client.
//!
//! Thin JSON-over-HTTPS wrapper: one generic [`ApiClient::call`] plus typed
//! methods for the handful of calls the dispatch core makes itself. Handler
//! code gets the same client through [`crate::Context`].

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Settings;
use crate::error::ApiError;
use crate::types::{AllowedUpdate, Message, Update, User};

/// Envelope every Bot API response is wrapped in.
#[derive(Debug, serde::Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i32>,
    parameters: Option<ResponseParameters>,
}

/// Extra hints Telegram attaches to some error responses.
#[derive(Debug, serde::Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

/// HTTP client bound to one bot token and API server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: SecretString,
    /// Extra headroom added on top of the long-poll wait for `getUpdates`
    /// requests, so the HTTP timeout never fires before the server answers.
    poll_slack: Duration,
}

impl ApiClient {
    pub(crate) fn new(settings: &Settings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(settings.http_timeout).build()?;
        Ok(Self {
            http,
            base: settings.api_url.clone(),
            token: settings.token.clone(),
            poll_slack: Duration::from_secs(10),
        })
    }

    fn method_url(&self, method: &str) -> String {
        let base = self.base.as_str().trim_end_matches('/');
        format!("{}/bot{}/{}", base, self.token.expose_secret(), method)
    }

    /// Invokes an arbitrary Bot API method with JSON parameters.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, ApiError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.call_with_timeout(method, params, None).await
    }

    async fn call_with_timeout<P, R>(
        &self,
        method: &str,
        params: &P,
        timeout: Option<Duration>,
    ) -> Result<R, ApiError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.http.post(self.method_url(method)).json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response: ApiResponse<R> = request.send().await?.json().await?;

        if !response.ok {
            return Err(ApiError::Telegram {
                code: response.error_code.unwrap_or(0),
                description: response.description.unwrap_or_else(|| "unknown error".to_owned()),
                retry_after: response
                    .parameters
                    .and_then(|p| p.retry_after)
                    .map(Duration::from_secs),
            });
        }
        response.result.ok_or(ApiError::MissingResult)
    }

    /// `getMe` — the bot's own identity.
    pub async fn get_me(&self) -> Result<User, ApiError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// `getUpdates` long-poll fetch. The HTTP timeout is stretched past the
    /// long-poll wait so an empty poll is not mistaken for a failure.
    pub async fn get_updates(&self, params: &GetUpdatesParams) -> Result<Vec<Update>, ApiError> {
        let timeout = Duration::from_secs(params.timeout.unwrap_or(0)) + self.poll_slack;
        self.call_with_timeout("getUpdates", params, Some(timeout)).await
    }

    /// `setWebhook` registration.
    pub async fn set_webhook(&self, params: &SetWebhookParams) -> Result<bool, ApiError> {
        self.call("setWebhook", params).await
    }

    /// `deleteWebhook` deregistration.
    pub async fn delete_webhook(&self) -> Result<bool, ApiError> {
        self.call("deleteWebhook", &serde_json::json!({})).await
    }

    /// `sendMessage` convenience used by [`crate::Context::reply`].
    pub async fn send_message(&self, params: &SendMessageParams) -> Result<Message, ApiError> {
        self.call("sendMessage", params).await
    }

    /// `answerCallbackQuery` convenience used by [`crate::Context::answer`].
    pub async fn answer_callback_query(
        &self,
        params: &AnswerCallbackQueryParams,
    ) -> Result<bool, ApiError> {
        self.call("answerCallbackQuery", params).await
    }
}

/// Parameters for `getUpdates`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u8>,
    /// Long-poll wait in whole seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<AllowedUpdate>>,
}

/// Parameters for `setWebhook`.
#[derive(Debug, Clone, Serialize)]
pub struct SetWebhookParams {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub drop_pending_updates: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<AllowedUpdate>>,
}

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}

/// Parameters for `answerCallbackQuery`.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQueryParams {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub show_alert: bool,
}
