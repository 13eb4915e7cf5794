// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use manifold_core::{ManifoldError, Subscriber, Subscription};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One observed subscriber callback, in arrival order.
#[derive(Debug, Clone)]
pub enum Signal<T> {
    Subscribed,
    Next(T),
    Error(ManifoldError),
    Complete,
}

/// A [`Subscriber`] that records every signal it receives.
///
/// The stored subscription can be driven through [`request`](Self::request)
/// and [`cancel`](Self::cancel), so tests read as: subscribe, request,
/// assert on the recorded signals. Optional panic switches simulate
/// misbehaving user callbacks.
pub struct RecordingSubscriber<T> {
    signals: Mutex<Vec<Signal<T>>>,
    subscription: Mutex<Option<Arc<dyn Subscription>>>,
    panic_on_subscribe: AtomicBool,
    panic_on_next: AtomicBool,
    panic_on_terminal: AtomicBool,
}

impl<T: Send> RecordingSubscriber<T> {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            signals: Mutex::new(Vec::new()),
            subscription: Mutex::new(None),
            panic_on_subscribe: AtomicBool::new(false),
            panic_on_next: AtomicBool::new(false),
            panic_on_terminal: AtomicBool::new(false),
        })
    }

    /// Panic inside `on_subscribe` (after recording the signal).
    #[must_use]
    pub fn panicking_on_subscribe() -> Arc<Self> {
        let subscriber = Self::new();
        subscriber.panic_on_subscribe.store(true, Ordering::SeqCst);
        subscriber
    }

    /// Panic inside `on_next` (after recording the item).
    #[must_use]
    pub fn panicking_on_next() -> Arc<Self> {
        let subscriber = Self::new();
        subscriber.panic_on_next.store(true, Ordering::SeqCst);
        subscriber
    }

    /// Panic inside `on_complete` / `on_error` (after recording the signal).
    #[must_use]
    pub fn panicking_on_terminal() -> Arc<Self> {
        let subscriber = Self::new();
        subscriber.panic_on_terminal.store(true, Ordering::SeqCst);
        subscriber
    }

    /// Request `n` items through the received subscription.
    ///
    /// # Panics
    ///
    /// Panics if `on_subscribe` has not been called yet.
    pub fn request(&self, n: u64) {
        let subscription = self
            .subscription
            .lock()
            .clone()
            .expect("request before on_subscribe");
        subscription.request(n);
    }

    /// Cancel the received subscription.
    ///
    /// # Panics
    ///
    /// Panics if `on_subscribe` has not been called yet.
    pub fn cancel(&self) {
        let subscription = self
            .subscription
            .lock()
            .clone()
            .expect("cancel before on_subscribe");
        subscription.cancel();
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.lock().is_some()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.signals
            .lock()
            .iter()
            .any(|s| matches!(s, Signal::Complete))
    }

    /// The first recorded error, if any.
    #[must_use]
    pub fn error(&self) -> Option<ManifoldError> {
        self.signals.lock().iter().find_map(|s| match s {
            Signal::Error(e) => Some(e.clone()),
            _ => None,
        })
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.signals
            .lock()
            .iter()
            .any(|s| matches!(s, Signal::Complete | Signal::Error(_)))
    }

    /// Number of recorded terminal signals; at most one is legal.
    #[must_use]
    pub fn terminal_count(&self) -> usize {
        self.signals
            .lock()
            .iter()
            .filter(|s| matches!(s, Signal::Complete | Signal::Error(_)))
            .count()
    }
}

impl<T: Clone + Send> RecordingSubscriber<T> {
    /// All recorded signals, in arrival order.
    #[must_use]
    pub fn signals(&self) -> Vec<Signal<T>> {
        self.signals.lock().clone()
    }

    /// Just the recorded items, in arrival order.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.signals
            .lock()
            .iter()
            .filter_map(|s| match s {
                Signal::Next(item) => Some(item.clone()),
                _ => None,
            })
            .collect()
    }
}

impl<T: Send> Subscriber<T> for RecordingSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.signals.lock().push(Signal::Subscribed);
        *self.subscription.lock() = Some(subscription);
        if self.panic_on_subscribe.load(Ordering::SeqCst) {
            panic!("on_subscribe panic requested by test");
        }
    }

    fn on_next(&self, item: T) {
        self.signals.lock().push(Signal::Next(item));
        if self.panic_on_next.load(Ordering::SeqCst) {
            panic!("on_next panic requested by test");
        }
    }

    fn on_error(&self, error: ManifoldError) {
        self.signals.lock().push(Signal::Error(error));
        if self.panic_on_terminal.load(Ordering::SeqCst) {
            panic!("on_error panic requested by test");
        }
    }

    fn on_complete(&self) {
        self.signals.lock().push(Signal::Complete);
        if self.panic_on_terminal.load(Ordering::SeqCst) {
            panic!("on_complete panic requested by test");
        }
    }
}
