// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Explicit subscribe-time context capture.
//!
//! Manifold deliberately has no process-wide ambient context: values that
//! must travel with a subscribe call (request ids, tracing baggage, tenant
//! tags) are captured into an immutable [`Context`] snapshot at the
//! `subscribe_with` boundary and threaded through explicitly. Operators that
//! subscribe upstream on behalf of a downstream subscriber pass along
//! whichever captured context their contract documents.

use crate::error::ManifoldError;
use crate::subscriber::Subscriber;
use crate::subscription::Subscription;
use std::collections::HashMap;
use std::sync::Arc;

/// An immutable key/value snapshot captured at subscribe time.
///
/// Cloning is cheap (shared storage). Deriving a new context with
/// [`with_value`](Context::with_value) copies the map, which is acceptable
/// for the small cardinalities contexts carry.
///
/// # Examples
///
/// ```
/// use manifold_core::Context;
///
/// let ctx = Context::default().with_value("request-id", "r-17");
/// assert_eq!(ctx.get("request-id"), Some("r-17"));
/// assert_eq!(ctx.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    entries: Arc<HashMap<String, String>>,
}

impl Context {
    /// Returns the value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns a new context with `key` set to `value`.
    #[must_use]
    pub fn with_value(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = (*self.entries).clone();
        entries.insert(key.into(), value.into());
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns `true` if this context carries no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pairs a subscriber with the context captured when it subscribed.
///
/// Operators use the wrapper on the subscription path (`on_subscribe`), where
/// environment propagation relative to the subscribing caller matters, and
/// dispatch items through the raw subscriber reference directly.
pub struct ContextPreservingSubscriber<T> {
    subscriber: Arc<dyn Subscriber<T>>,
    context: Context,
}

impl<T> ContextPreservingSubscriber<T> {
    /// Wrap `subscriber` with its capture-time `context`.
    pub fn new(subscriber: Arc<dyn Subscriber<T>>, context: Context) -> Self {
        Self {
            subscriber,
            context,
        }
    }

    /// The context captured when the wrapped subscriber subscribed.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The raw, unwrapped subscriber.
    #[must_use]
    pub fn raw(&self) -> &Arc<dyn Subscriber<T>> {
        &self.subscriber
    }
}

impl<T> Subscriber<T> for ContextPreservingSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.subscriber.on_subscribe(subscription);
    }

    fn on_next(&self, item: T) {
        self.subscriber.on_next(item);
    }

    fn on_error(&self, error: ManifoldError) {
        self.subscriber.on_error(error);
    }

    fn on_complete(&self) {
        self.subscriber.on_complete();
    }
}
