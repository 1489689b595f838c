//! The bot: registration surface, dispatcher, and lifecycle controller.
//!
//! [`Bot`] is a cheap-clone handle over shared state. Handlers register at
//! any time, including from inside other handlers; a running loop picks up
//! new registrations on the next lookup. [`Bot::process_update`] is the
//! dispatcher itself and is public, so updates can be pushed through the
//! bot from any transport, not just the built-in poller and webhook.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicI64;

use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::api::{ApiClient, SetWebhookParams};
use crate::config::{DispatchMode, Settings, WebhookConfig};
use crate::context::Context;
use crate::dispatch::{Classification, classify};
use crate::error::{DispatchError, Error, Result};
use crate::event::{Event, On, callback_key};
use crate::registry::{Handler, HandlerRegistry, wrap};
use crate::types::{Update, User};
use crate::{poller, webhook};

/// Updates buffered between the update source and the dispatch loop. When
/// the buffer is full the source waits; for polling that also holds back
/// offset confirmation.
const DISPATCH_QUEUE_DEPTH: usize = 100;

/// Hook invoked for every handler error and every fetch failure. The
/// context is present for handler errors and absent for source errors.
type ErrorHook = Arc<dyn Fn(anyhow::Error, Option<Context>) + Send + Sync>;

/// A Telegram bot with its handler registry and update sources.
#[derive(Clone)]
pub struct Bot {
    inner: Arc<BotInner>,
}

struct BotInner {
    api: ApiClient,
    me: User,
    settings: Settings,
    registry: HandlerRegistry,
    on_error: RwLock<ErrorHook>,
    /// Next `getUpdates` offset; 0 means nothing confirmed yet. Written
    /// only by the poller, after the dispatch channel accepts an update.
    offset: AtomicI64,
    /// In-flight concurrent handler tasks, so `stop` can wait for them.
    tasks: TaskTracker,
    running: Mutex<Option<Running>>,
}

struct Running {
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
    delete_webhook: bool,
}

impl Bot {
    /// Builds the bot and resolves its own identity.
    ///
    /// Calls `getMe` unless [`Settings::me`] preset an identity.
    pub async fn connect(settings: Settings) -> Result<Self> {
        let api = ApiClient::new(&settings).map_err(Error::Api)?;
        let me = match settings.me.clone() {
            Some(me) => me,
            None => api.get_me().await.map_err(Error::Api)?,
        };
        tracing::info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or_default(),
            "bot connected"
        );
        Ok(Self {
            inner: Arc::new(BotInner {
                api,
                me,
                settings,
                registry: HandlerRegistry::new(),
                on_error: RwLock::new(Arc::new(default_error_hook)),
                offset: AtomicI64::new(0),
                tasks: TaskTracker::new(),
                running: Mutex::new(None),
            }),
        })
    }

    /// The outbound API client, for calls the typed surface doesn't cover.
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// The bot's own identity.
    pub fn me(&self) -> &User {
        &self.inner.me
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.registry.len()
    }

    pub(crate) fn poller_config(&self) -> &crate::config::PollerConfig {
        &self.inner.settings.poller
    }

    pub(crate) fn offset(&self) -> &AtomicI64 {
        &self.inner.offset
    }

    /// Registers a handler under any kind of key. Registering the same key
    /// again replaces the previous handler.
    pub fn handle<K, F, Fut>(&self, on: K, handler: F) -> Result<()>
    where
        K: Into<On>,
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let key = on.into().into_key()?;
        self.inner.registry.insert(key, wrap(handler));
        Ok(())
    }

    /// Registers a slash-command handler, e.g. `"/start"`.
    pub fn command<F, Fut>(&self, command: &str, handler: F) -> Result<()>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handle(On::Command(command.to_owned()), handler)
    }

    /// Registers a handler for a non-command event kind.
    pub fn on<F, Fut>(&self, event: Event, handler: F) -> Result<()>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handle(On::Event(event), handler)
    }

    /// Registers a handler for callback data carrying the given unique
    /// token (see [`crate::event::callback_data`]).
    pub fn callback<F, Fut>(&self, unique: &str, handler: F) -> Result<()>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handle(On::Callback(unique.to_owned()), handler)
    }

    /// Replaces the error hook. The default hook logs at error level.
    pub fn on_error<F>(&self, hook: F)
    where
        F: Fn(anyhow::Error, Option<Context>) + Send + Sync + 'static,
    {
        let mut guard = match self.inner.on_error.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::new(hook);
    }

    fn error_hook(&self) -> ErrorHook {
        let guard = match self.inner.on_error.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(&guard)
    }

    pub(crate) fn report(&self, err: anyhow::Error, context: Option<Context>) {
        (self.error_hook())(err, context);
    }

    /// Classifies and dispatches one update.
    ///
    /// This is the whole dispatcher; the polling and webhook loops feed it
    /// and log its errors. Calling it directly is supported for custom
    /// transports and tests. In concurrent mode the handler is spawned onto
    /// the shared task tracker, but only [`Bot::stop`] of a running session
    /// waits for tracked handlers; on a bot that was never started, `stop`
    /// is a no-op and leaves them running.
    pub async fn process_update(&self, update: Update) -> std::result::Result<(), DispatchError> {
        let update = Arc::new(update);
        match classify(&update, &self.inner.me)? {
            Classification::Command { key, payload } => {
                // An unregistered command is still text; fall back before
                // giving up.
                let handler = self
                    .inner
                    .registry
                    .get(&key)
                    .or_else(|| self.inner.registry.get(&Event::Text.key()))
                    .ok_or(DispatchError::NoHandler(Event::Text))?;
                self.invoke(handler, Context::new(self.clone(), update, payload)).await;
                Ok(())
            }
            Classification::CallbackUnique { unique, payload } => {
                let handler = self
                    .inner
                    .registry
                    .get(&callback_key(&unique))
                    .or_else(|| self.inner.registry.get(&Event::Callback.key()))
                    .ok_or(DispatchError::NoHandler(Event::Callback))?;
                self.invoke(handler, Context::new(self.clone(), update, payload)).await;
                Ok(())
            }
            Classification::Single(event) => {
                let handler = self
                    .inner
                    .registry
                    .get(&event.key())
                    .or_else(|| {
                        event.fallback().and_then(|generic| self.inner.registry.get(&generic.key()))
                    })
                    .ok_or(DispatchError::NoHandler(event))?;
                self.invoke(handler, Context::new(self.clone(), update, None)).await;
                Ok(())
            }
            Classification::UsersJoined => self.dispatch_users_joined(&update).await,
        }
    }

    /// Dispatches a multi-user join once per joined user, each invocation
    /// seeing an update with exactly that one user. Invocations are awaited
    /// inline even in concurrent mode so the per-user outcomes can be
    /// aggregated.
    async fn dispatch_users_joined(
        &self,
        update: &Arc<Update>,
    ) -> std::result::Result<(), DispatchError> {
        let handler = self
            .inner
            .registry
            .get(&Event::UserJoined.key())
            .ok_or(DispatchError::NoHandler(Event::UserJoined))?;

        let users = update
            .message
            .as_ref()
            .and_then(|message| message.new_chat_members.clone())
            .unwrap_or_default();
        let total = users.len();
        let mut handled = 0;

        for user in users {
            let mut single = (**update).clone();
            if let Some(message) = single.message.as_mut() {
                message.new_chat_members = Some(vec![user]);
            }
            let context = Context::new(self.clone(), Arc::new(single), None);
            match handler(context.clone()).await {
                Ok(()) => handled += 1,
                Err(err) => self.report(err, Some(context)),
            }
        }

        if handled == total {
            Ok(())
        } else {
            Err(DispatchError::PartiallyHandled { handled, total })
        }
    }

    async fn invoke(&self, handler: Handler, context: Context) {
        match self.inner.settings.mode {
            DispatchMode::Sync => {
                if let Err(err) = handler(context.clone()).await {
                    self.report(err, Some(context));
                }
            }
            DispatchMode::Concurrent => {
                let bot = self.clone();
                self.inner.tasks.spawn(async move {
                    if let Err(err) = handler(context.clone()).await {
                        bot.report(err, Some(context));
                    }
                });
            }
        }
    }

    /// Starts the long-poll loop. Returns immediately; the loop runs on
    /// background tasks until [`Bot::stop`].
    pub async fn start_polling(&self) -> Result<()> {
        let mut running = self.inner.running.lock().await;
        if running.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(DISPATCH_QUEUE_DEPTH);
        let poll_task = tokio::spawn(poller::run(self.clone(), tx, cancel.clone()));
        let dispatch_task = tokio::spawn(self.clone().dispatch_loop(rx, cancel.clone()));

        tracing::info!("long polling started");
        *running = Some(Running {
            cancel,
            workers: vec![poll_task, dispatch_task],
            delete_webhook: false,
        });
        Ok(())
    }

    /// Registers the webhook with Telegram and starts the local listener.
    /// Returns the bound address (useful with a port-0 bind).
    ///
    /// The local bind happens before `setWebhook`, so a failure on either
    /// side leaves the bot stopped with nothing registered remotely.
    pub async fn start_webhook(&self, config: WebhookConfig) -> Result<SocketAddr> {
        let mut running = self.inner.running.lock().await;
        if running.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let listener = TcpListener::bind(config.listen).await?;
        let addr = listener.local_addr()?;

        self.inner
            .api
            .set_webhook(&SetWebhookParams {
                url: config.url.to_string(),
                secret_token: config.secret_token.clone(),
                drop_pending_updates: config.drop_pending_updates,
                max_connections: config.max_connections,
                allowed_updates: config.allowed_updates.clone(),
            })
            .await
            .map_err(Error::Api)?;

        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(DISPATCH_QUEUE_DEPTH);
        let state = webhook::WebhookState { tx, secret: config.secret_token.clone() };
        let router = webhook::router(&config.route_path(), state);
        let serve_task = tokio::spawn(webhook::serve(listener, router, cancel.clone()));
        let dispatch_task = tokio::spawn(self.clone().dispatch_loop(rx, cancel.clone()));

        tracing::info!(%addr, url = %config.url, "webhook listener started");
        *running = Some(Running {
            cancel,
            workers: vec![serve_task, dispatch_task],
            delete_webhook: config.delete_on_stop,
        });
        Ok(addr)
    }

    /// Stops the running update source, waits for its loops to exit, then
    /// waits up to [`Settings::handler_join_timeout`] for in-flight
    /// concurrent handlers. Idempotent; a stopped bot can be started again.
    pub async fn stop(&self) {
        let state = self.inner.running.lock().await.take();
        let Some(state) = state else {
            return;
        };

        state.cancel.cancel();
        for worker in state.workers {
            if let Err(err) = worker.await {
                tracing::warn!(error = %err, "worker task panicked");
            }
        }

        if state.delete_webhook {
            if let Err(err) = self.inner.api.delete_webhook().await {
                tracing::warn!(error = %err, "deleteWebhook failed during stop");
            }
        }

        self.inner.tasks.close();
        if let Some(limit) = self.inner.settings.handler_join_timeout {
            if tokio::time::timeout(limit, self.inner.tasks.wait()).await.is_err() {
                tracing::warn!("handlers still running after join timeout; detaching");
            }
        }
        // Reopened so a later start can track a fresh set of handlers.
        self.inner.tasks.reopen();
        tracing::info!("bot stopped");
    }

    async fn dispatch_loop(self, mut rx: mpsc::Receiver<Update>, cancel: CancellationToken) {
        loop {
            let update = tokio::select! {
                () = cancel.cancelled() => return,
                update = rx.recv() => match update {
                    Some(update) => update,
                    None => return,
                },
            };
            let update_id = update.update_id;
            if let Err(err) = self.process_update(update).await {
                // Routing misses are per-update conditions, never fatal to
                // the loop.
                tracing::warn!(update_id, error = %err, "update not dispatched");
            }
        }
    }
}

fn default_error_hook(err: anyhow::Error, context: Option<Context>) {
    let update_id = context.as_ref().map(|c| c.update().update_id);
    tracing::error!(error = %err, update_id, "handler error");
}
