// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::{MulticastBuilder, MulticastConfig};
use crate::fan_out::{FanOutState, SubscriptionEvent};
use crate::leaf::Leaf;
use arc_swap::ArcSwap;
use manifold_core::{Context, EmptySubscription, ManifoldError, Publisher, Subscriber};
use std::sync::{Arc, Weak};

/// Lifts a single-subscriber [`Publisher`] into one that fans items out to a
/// group of subscribers, requesting upstream only what the slowest member of
/// the group has authorized.
///
/// The source is subscribed exactly once per epoch, when the configured
/// number of subscribers (default 1) have attached; every item is then
/// delivered to each live subscriber by value. The upstream never sees more
/// demand than the minimum cumulative demand across the group, so a slow
/// subscriber exerts backpressure on all of its peers. After the source
/// terminates, the terminal signal is replayed to late subscribers until the
/// configured resubscribe policy (default: never) resets the operator for a
/// fresh upstream lifecycle.
///
/// Handles are cheap to clone and share one fan-out state.
///
/// # Examples
///
/// ```
/// use manifold_multicast::MulticastPublisher;
/// use manifold_core::Publisher;
/// # use manifold_core::{Context, Subscriber};
/// # use std::sync::Arc;
/// # struct Silent;
/// # impl Publisher<u32> for Silent {
/// #     fn subscribe_with(&self, _s: Arc<dyn Subscriber<u32>>, _c: Context) {}
/// # }
/// # let source: Arc<dyn Publisher<u32>> = Arc::new(Silent);
///
/// let shared = MulticastPublisher::builder(source)
///     .min_subscribers(2)
///     .build();
/// assert_eq!(shared.subscriber_count(), 0);
/// ```
pub struct MulticastPublisher<T: Clone + Send + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone + Send + 'static> MulticastPublisher<T> {
    /// Multicast `source` with default settings.
    #[must_use]
    pub fn new(source: Arc<dyn Publisher<T>>) -> Self {
        Self::builder(source).build()
    }

    /// Start configuring a multicast of `source`.
    #[must_use]
    pub fn builder(source: Arc<dyn Publisher<T>>) -> MulticastBuilder<T> {
        MulticastBuilder::new(source)
    }

    pub(crate) fn from_parts(source: Arc<dyn Publisher<T>>, config: MulticastConfig) -> Self {
        let config = Arc::new(config);
        let inner = Arc::new_cyclic(|weak_self: &Weak<Inner<T>>| Inner {
            source,
            config: config.clone(),
            epoch: ArcSwap::new(FanOutState::new(weak_self.clone(), config)),
            weak_self: weak_self.clone(),
        });
        Self { inner }
    }

    /// Number of subscribers currently attached to the live epoch.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.epoch.load().live_count()
    }

    /// Returns `true` while the current epoch holds a terminal signal that
    /// has not been reset by the resubscribe policy.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.inner.epoch.load().is_terminated()
    }
}

impl<T: Clone + Send + 'static> Clone for MulticastPublisher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Publisher<T> for MulticastPublisher<T> {
    fn subscribe_with(&self, subscriber: Arc<dyn Subscriber<T>>, context: Context) {
        self.inner.subscribe_with(subscriber, context);
    }
}

/// Shared state behind cloneable [`MulticastPublisher`] handles: the source,
/// the configuration, and the current epoch.
pub(crate) struct Inner<T: Clone + Send + 'static> {
    source: Arc<dyn Publisher<T>>,
    config: Arc<MulticastConfig>,
    epoch: ArcSwap<FanOutState<T>>,
    weak_self: Weak<Inner<T>>,
}

impl<T: Clone + Send + 'static> Inner<T> {
    pub(crate) fn subscribe_with(&self, subscriber: Arc<dyn Subscriber<T>>, context: Context) {
        let epoch = self.epoch.load_full();
        let ordinal = epoch.next_ordinal();
        if self.config.exactly_min_subscribers && ordinal > self.config.min_subscribers {
            // Rejected immediately, from the caller's thread; the group is
            // untouched.
            subscriber.on_subscribe(Arc::new(EmptySubscription));
            subscriber.on_error(ManifoldError::rejected_subscribe(self.config.min_subscribers));
            return;
        }
        let leaf = Leaf::new(
            epoch.clone(),
            subscriber,
            context.clone(),
            ordinal,
            self.config.cancel_upstream,
        );
        epoch.enqueue_and_process(SubscriptionEvent::Subscribe { leaf, context });
    }

    pub(crate) fn source(&self) -> &Arc<dyn Publisher<T>> {
        &self.source
    }

    /// Swap in a fresh epoch, provided `old` is still the installed one.
    pub(crate) fn reset_from(&self, old: &FanOutState<T>) {
        let current = self.epoch.load_full();
        if std::ptr::eq(Arc::as_ptr(&current), old as *const FanOutState<T>) {
            self.epoch
                .store(FanOutState::new(self.weak_self.clone(), self.config.clone()));
        }
    }
}
