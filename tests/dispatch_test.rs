//! Dispatcher behavior driven through `Bot::process_update` with a preset
//! identity, so no network is involved.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use telepoll::types::{CallbackQuery, Chat, Message, PhotoSize, Update, User};
use telepoll::{Bot, DispatchError, DispatchMode, Error, Event, Settings};

fn me() -> User {
    User { id: 1000, is_bot: true, username: Some("mybot".to_owned()), ..Default::default() }
}

async fn bot() -> Bot {
    let settings = Settings::new("123:abc").me(me()).mode(DispatchMode::Sync);
    Bot::connect(settings).await.unwrap()
}

fn text_update(update_id: i64, text: &str) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id,
            chat: Chat { id: 77, chat_type: "private".to_owned(), ..Default::default() },
            from: Some(User { id: 5, first_name: "Ann".to_owned(), ..Default::default() }),
            text: Some(text.to_owned()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_command_handler_receives_payload() {
    let bot = bot().await;
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    bot.command("/start", move |ctx| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().unwrap().push(ctx.data().unwrap_or_default().to_owned());
            Ok(())
        }
    })
    .unwrap();

    bot.process_update(text_update(1, "/start deep link")).await.unwrap();
    bot.process_update(text_update(2, "/start")).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["deep link".to_owned(), String::new()]);
}

#[tokio::test]
async fn test_command_addressed_to_other_bot_is_ignored() {
    let bot = bot().await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    bot.command("/start", move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();

    let err = bot.process_update(text_update(1, "/start@otherbot")).await.unwrap_err();
    assert_eq!(err, DispatchError::ForeignBotCommand { target: "otherbot".to_owned() });
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Addressed to us, any case: dispatched.
    bot.process_update(text_update(2, "/start@MyBot")).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unregistered_command_falls_back_to_text_handler() {
    let bot = bot().await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    bot.on(Event::Text, move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();

    bot.process_update(text_update(1, "/unknown")).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_no_handler_is_reported() {
    let bot = bot().await;
    let err = bot.process_update(text_update(1, "hello")).await.unwrap_err();
    assert_eq!(err, DispatchError::NoHandler(Event::Text));
}

#[tokio::test]
async fn test_marker_prefixed_text_is_rejected() {
    let bot = bot().await;
    let err = bot.process_update(text_update(1, "\u{7}text")).await.unwrap_err();
    assert_eq!(err, DispatchError::MaliciousInput);
}

#[tokio::test]
async fn test_callback_unique_routes_with_payload() {
    let bot = bot().await;
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    bot.callback("menu", move |ctx| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().unwrap().push(ctx.data().map(str::to_owned));
            Ok(())
        }
    })
    .unwrap();

    let update = Update {
        update_id: 1,
        callback_query: Some(CallbackQuery {
            id: "q1".to_owned(),
            data: Some(telepoll::callback_data("menu", Some("42"))),
            ..Default::default()
        }),
        ..Default::default()
    };
    bot.process_update(update).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![Some("42".to_owned())]);
}

#[tokio::test]
async fn test_unknown_unique_falls_back_to_generic_callback_handler() {
    let bot = bot().await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    bot.on(Event::Callback, move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();

    let update = Update {
        update_id: 1,
        callback_query: Some(CallbackQuery {
            data: Some(telepoll::callback_data("nobody-registered-this", None)),
            ..Default::default()
        }),
        ..Default::default()
    };
    bot.process_update(update).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_media_kind_falls_back_to_media_handler() {
    let bot = bot().await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    bot.on(Event::Media, move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();

    let update = Update {
        update_id: 1,
        message: Some(Message {
            photo: Some(vec![PhotoSize::default()]),
            ..Default::default()
        }),
        ..Default::default()
    };
    bot.process_update(update).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_latest_registration_wins() {
    let bot = bot().await;
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&first);
    bot.command("/start", move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();
    let counter = Arc::clone(&second);
    bot.command("/start", move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();

    bot.process_update(text_update(1, "/start")).await.unwrap();
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
    assert_eq!(bot.handler_count(), 1);
}

#[tokio::test]
async fn test_users_joined_dispatches_once_per_user() {
    let bot = bot().await;
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    bot.on(Event::UserJoined, move |ctx| {
        let sink = Arc::clone(&sink);
        async move {
            let user = ctx.joined_user().cloned().unwrap();
            sink.lock().unwrap().push(user.id);
            if user.id == 2 {
                anyhow::bail!("rejected user 2");
            }
            Ok(())
        }
    })
    .unwrap();

    let update = Update {
        update_id: 1,
        message: Some(Message {
            chat: Chat { id: 77, ..Default::default() },
            new_chat_members: Some(vec![
                User { id: 1, ..Default::default() },
                User { id: 2, ..Default::default() },
                User { id: 3, ..Default::default() },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    };

    let err = bot.process_update(update).await.unwrap_err();
    assert_eq!(err, DispatchError::PartiallyHandled { handled: 2, total: 3 });
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_bot_joining_is_added_to_group() {
    let bot = bot().await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    bot.on(Event::AddedToGroup, move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();

    let update = Update {
        update_id: 1,
        message: Some(Message {
            new_chat_members: Some(vec![User { id: 4, ..Default::default() }, me()]),
            ..Default::default()
        }),
        ..Default::default()
    };
    bot.process_update(update).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_error_reaches_error_hook() {
    let bot = bot().await;
    let reported = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&reported);
    bot.on_error(move |err, ctx| {
        sink.lock().unwrap().push((err.to_string(), ctx.map(|c| c.update().update_id)));
    });
    bot.command("/fail", |_ctx| async move { anyhow::bail!("boom") }).unwrap();

    // A handler error is reported, never surfaced as a dispatch error.
    bot.process_update(text_update(9, "/fail")).await.unwrap();
    assert_eq!(*reported.lock().unwrap(), vec![("boom".to_owned(), Some(9))]);
}

#[tokio::test]
async fn test_registration_rejects_malformed_keys() {
    let bot = bot().await;
    assert!(matches!(
        bot.command("start", |_ctx| async move { Ok(()) }),
        Err(Error::InvalidCommand(_))
    ));
    assert!(matches!(
        bot.callback("a|b", |_ctx| async move { Ok(()) }),
        Err(Error::InvalidCallbackUnique(_))
    ));
}
