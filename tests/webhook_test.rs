//! Webhook listener behavior: registration, secret validation, malformed
//! bodies, and shutdown deregistration.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use telepoll::types::User;
use telepoll::{Bot, DispatchMode, Error, Event, Settings, WebhookConfig};
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

fn me() -> User {
    User { id: 1000, is_bot: true, username: Some("mybot".to_owned()), ..Default::default() }
}

fn settings(server: &MockServer) -> Settings {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    Settings::new("123:abc")
        .api_url(Url::parse(&server.uri()).unwrap())
        .me(me())
        .mode(DispatchMode::Sync)
}

fn webhook_config() -> WebhookConfig {
    WebhookConfig::new(
        Url::parse("https://bot.example.com/hook").unwrap(),
        "127.0.0.1:0".parse().unwrap(),
    )
}

fn update_json(update_id: i64, text: &str) -> serde_json::Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "date": 1700000000,
            "chat": {"id": 77, "type": "private"},
            "from": {"id": 5, "is_bot": false, "first_name": "Ann"},
            "text": text
        }
    })
}

async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_webhook_receives_and_dispatches_updates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/setWebhook"))
        .and(body_partial_json(json!({
            "url": "https://bot.example.com/hook",
            "secret_token": "s3cret"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/deleteWebhook"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let bot = Bot::connect(settings(&server)).await.unwrap();
    let handled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&handled);
    bot.on(Event::Text, move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();

    let config = webhook_config().secret_token("s3cret").delete_on_stop();
    let addr = bot.start_webhook(config).await.unwrap();
    let endpoint = format!("http://{addr}/hook");
    let client = reqwest::Client::new();

    // Valid update with the right secret.
    let response = client
        .post(&endpoint)
        .header(SECRET_HEADER, "s3cret")
        .json(&update_json(1, "hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    wait_until(|| handled.load(Ordering::SeqCst) == 1).await;

    // Wrong secret is rejected without dispatch.
    let response = client
        .post(&endpoint)
        .header(SECRET_HEADER, "wrong")
        .json(&update_json(2, "sneaky"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Malformed body is rejected but the listener stays up.
    let response = client
        .post(&endpoint)
        .header(SECRET_HEADER, "s3cret")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .post(&endpoint)
        .header(SECRET_HEADER, "s3cret")
        .json(&update_json(3, "still alive"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    wait_until(|| handled.load(Ordering::SeqCst) == 2).await;

    // Stop deregisters (deleteWebhook expectation) and frees the port.
    bot.stop().await;
    assert!(client.post(&endpoint).send().await.is_err());
}

#[tokio::test]
async fn test_rejected_registration_leaves_bot_stopped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/setWebhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "bad webhook: HTTPS url must be provided"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getUpdates"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": []})),
        )
        .mount(&server)
        .await;

    let bot = Bot::connect(settings(&server)).await.unwrap();
    assert!(matches!(bot.start_webhook(webhook_config()).await, Err(Error::Api(_))));

    // The failed start left no session behind; polling can start.
    bot.start_polling().await.unwrap();
    bot.stop().await;
}

#[tokio::test]
async fn test_failed_bind_never_registers_the_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/setWebhook"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})),
        )
        .expect(0)
        .mount(&server)
        .await;

    let bot = Bot::connect(settings(&server)).await.unwrap();
    // TEST-NET-3 address, not assigned locally, so the bind fails.
    let config = WebhookConfig::new(
        Url::parse("https://bot.example.com/hook").unwrap(),
        "203.0.113.1:9".parse().unwrap(),
    );
    assert!(matches!(bot.start_webhook(config).await, Err(Error::Io(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_without_secret_accepts_unmarked_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/setWebhook"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})),
        )
        .mount(&server)
        .await;

    let bot = Bot::connect(settings(&server)).await.unwrap();
    let handled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&handled);
    bot.on(Event::Text, move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();

    let addr = bot.start_webhook(webhook_config()).await.unwrap();
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/hook"))
        .json(&update_json(1, "no secret configured"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    wait_until(|| handled.load(Ordering::SeqCst) == 1).await;
    bot.stop().await;
}
