//! Handler storage.
//!
//! A flat concurrent map from registration key to boxed handler. Commands,
//! symbolic endpoints, and callback uniques share the map; the reserved
//! marker prefixes keep their namespaces disjoint.

use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::BoxFuture;

use crate::context::Context;

/// A registered update handler.
pub(crate) type Handler =
    Arc<dyn Fn(Context) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Default)]
pub(crate) struct HandlerRegistry {
    handlers: DashMap<String, Handler>,
}

impl HandlerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under a key. Re-registering replaces the previous
    /// handler; the latest registration wins.
    pub(crate) fn insert(&self, key: String, handler: Handler) {
        if self.handlers.insert(key.clone(), handler).is_some() {
            tracing::debug!(key = %key.trim_start_matches(|c: char| c.is_control()), "handler replaced");
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<Handler> {
        self.handlers.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }
}

/// Boxes a user closure into the stored handler shape.
pub(crate) fn wrap<F, Fut>(handler: F) -> Handler
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |context| Box::pin(handler(context)))
}
