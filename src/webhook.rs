//! Inbound webhook listener.
//!
//! A single POST route on the path of the registered public URL. The
//! listener validates the secret token, parses the body, and forwards the
//! update to the same dispatch channel the long poller would use. A bad
//! request never takes the listener down.

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::types::Update;

pub(crate) const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub(crate) struct WebhookState {
    pub(crate) tx: mpsc::Sender<Update>,
    pub(crate) secret: Option<String>,
}

pub(crate) fn router(path: &str, state: WebhookState) -> Router {
    Router::new().route(path, post(receive_update)).with_state(state)
}

async fn receive_update(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    if let Some(expected) = &state.secret {
        let presented = headers.get(SECRET_TOKEN_HEADER).and_then(|value| value.to_str().ok());
        if presented != Some(expected.as_str()) {
            tracing::warn!("webhook request with missing or wrong secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update: Update = match serde_json::from_str(&body) {
        Ok(update) => update,
        Err(err) => {
            tracing::warn!(error = %err, "discarding malformed webhook body");
            return StatusCode::BAD_REQUEST;
        }
    };

    let update_id = update.update_id;
    if state.tx.send(update).await.is_err() {
        tracing::warn!(update_id, "dispatch channel closed; rejecting update");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

pub(crate) async fn serve(listener: TcpListener, router: Router, cancel: CancellationToken) {
    let shutdown = cancel.cancelled_owned();
    if let Err(err) = axum::serve(listener, router).with_graceful_shutdown(shutdown).await {
        tracing::error!(error = %err, "webhook listener failed");
    }
}
