// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use manifold_core::{Context, ManifoldError, Publisher, Result, Subscriber, Subscription};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The [`Subscription`] a [`ManualSource`] hands to its subscriber, recording
/// every `request` batch and the cancel flag.
pub struct RecordingSubscription {
    requests: Mutex<Vec<u64>>,
    cancelled: AtomicBool,
}

impl RecordingSubscription {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            cancelled: AtomicBool::new(false),
        })
    }

    /// Every `request` batch, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<u64> {
        self.requests.lock().clone()
    }

    /// Total demand requested so far, saturating.
    #[must_use]
    pub fn total_requested(&self) -> u64 {
        self.requests
            .lock()
            .iter()
            .fold(0u64, |total, &n| total.saturating_add(n))
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Subscription for RecordingSubscription {
    fn request(&self, n: u64) {
        self.requests.lock().push(n);
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

struct Attachment<T> {
    subscriber: Arc<dyn Subscriber<T>>,
    context: Context,
    subscription: Arc<RecordingSubscription>,
}

/// A [`Publisher`] driven imperatively from test code.
///
/// Each subscribe is recorded along with its context and answered with a
/// fresh [`RecordingSubscription`]; items and terminal signals are then
/// emitted by calling [`emit`](Self::emit), [`complete`](Self::complete) or
/// [`fail`](Self::fail), which deliver to the most recent subscriber. This
/// keeps tests imperative while the operator under test stays declarative.
pub struct ManualSource<T> {
    attachments: Mutex<Vec<Attachment<T>>>,
}

impl<T: Clone + Send + 'static> ManualSource<T> {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attachments: Mutex::new(Vec::new()),
        })
    }

    /// Number of subscribe calls observed so far.
    #[must_use]
    pub fn subscribe_count(&self) -> usize {
        self.attachments.lock().len()
    }

    /// The context captured by the `index`-th subscribe call.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `index + 1` subscribes happened.
    #[must_use]
    pub fn context_at(&self, index: usize) -> Context {
        self.attachments.lock()[index].context.clone()
    }

    /// The subscription handed out by the `index`-th subscribe call.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `index + 1` subscribes happened.
    #[must_use]
    pub fn subscription_at(&self, index: usize) -> Arc<RecordingSubscription> {
        self.attachments.lock()[index].subscription.clone()
    }

    /// `request` batches observed on the most recent subscription.
    ///
    /// # Panics
    ///
    /// Panics if nothing has subscribed yet.
    #[must_use]
    pub fn requests(&self) -> Vec<u64> {
        self.latest()
            .expect("no subscriber attached yet")
            .subscription
            .requests()
    }

    /// Total demand observed on the most recent subscription.
    ///
    /// # Panics
    ///
    /// Panics if nothing has subscribed yet.
    #[must_use]
    pub fn total_requested(&self) -> u64 {
        self.latest()
            .expect("no subscriber attached yet")
            .subscription
            .total_requested()
    }

    /// Whether the most recent subscription was cancelled.
    ///
    /// # Panics
    ///
    /// Panics if nothing has subscribed yet.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.latest()
            .expect("no subscriber attached yet")
            .subscription
            .is_cancelled()
    }

    /// Deliver `item` to the most recent subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing has subscribed yet.
    pub fn emit(&self, item: T) -> Result<()> {
        self.latest()?.subscriber.on_next(item);
        Ok(())
    }

    /// Complete the most recent subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing has subscribed yet.
    pub fn complete(&self) -> Result<()> {
        self.latest()?.subscriber.on_complete();
        Ok(())
    }

    /// Fail the most recent subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing has subscribed yet.
    pub fn fail(&self, error: ManifoldError) -> Result<()> {
        self.latest()?.subscriber.on_error(error);
        Ok(())
    }

    fn latest(&self) -> Result<Attachment<T>> {
        let attachments = self.attachments.lock();
        let last = attachments
            .last()
            .ok_or_else(|| ManifoldError::stream_error("no subscriber attached yet"))?;
        Ok(Attachment {
            subscriber: last.subscriber.clone(),
            context: last.context.clone(),
            subscription: last.subscription.clone(),
        })
    }
}

impl<T: Clone + Send + 'static> Publisher<T> for ManualSource<T> {
    fn subscribe_with(&self, subscriber: Arc<dyn Subscriber<T>>, context: Context) {
        let subscription = RecordingSubscription::new();
        self.attachments.lock().push(Attachment {
            subscriber: subscriber.clone(),
            context,
            subscription: subscription.clone(),
        });
        subscriber.on_subscribe(subscription);
    }
}
