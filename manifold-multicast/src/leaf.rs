// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Per-subscriber state inside a fan-out epoch.

use crate::demand_queue::{DemandEntry, NOT_IN_QUEUE};
use crate::fan_out::{FanOutState, SubscriptionEvent};
use manifold_core::demand::{add_demand, is_demand_valid};
use manifold_core::{Context, ContextPreservingSubscriber, ManifoldError, Subscriber, Subscription};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// One attached subscriber: its demand accounting plus the [`Subscription`]
/// handed back to it.
///
/// `request`/`cancel` calls never mutate shared fan-out state directly; they
/// post events to the owning epoch so that all mutations are serialized. The
/// only signal delivered from the caller's thread is the immediate error for
/// an invalid (zero) demand.
pub(crate) struct Leaf<T: Clone + Send + 'static> {
    epoch: Arc<FanOutState<T>>,
    wrapped: ContextPreservingSubscriber<T>,
    ordinal: usize,
    cancel_upstream: bool,
    /// Cumulative demand granted by this subscriber, saturating.
    demand: AtomicU64,
    /// Upstream floor at the moment this leaf joined; demand is seeded here so
    /// a late joiner never lowers the group minimum below what was already
    /// requested upstream.
    joined_floor: AtomicU64,
    /// Back-pointer into the epoch's demand queue.
    queue_index: AtomicUsize,
    terminated: AtomicBool,
    cancelled: AtomicBool,
    weak_self: Weak<Leaf<T>>,
}

impl<T: Clone + Send + 'static> Leaf<T> {
    pub(crate) fn new(
        epoch: Arc<FanOutState<T>>,
        subscriber: Arc<dyn Subscriber<T>>,
        context: Context,
        ordinal: usize,
        cancel_upstream: bool,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            epoch,
            wrapped: ContextPreservingSubscriber::new(subscriber, context),
            ordinal,
            cancel_upstream,
            demand: AtomicU64::new(0),
            joined_floor: AtomicU64::new(0),
            queue_index: AtomicUsize::new(NOT_IN_QUEUE),
            terminated: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            weak_self: weak_self.clone(),
        })
    }

    pub(crate) fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub(crate) fn cancel_upstream(&self) -> bool {
        self.cancel_upstream
    }

    /// The subscriber as originally handed to `subscribe`, without the
    /// context-preserving wrapper.
    pub(crate) fn raw(&self) -> &Arc<dyn Subscriber<T>> {
        self.wrapped.raw()
    }

    pub(crate) fn wrapped(&self) -> &ContextPreservingSubscriber<T> {
        &self.wrapped
    }

    /// Seed demand at the group's current floor upon joining.
    pub(crate) fn seed(&self, floor: u64) {
        self.demand.store(floor, Ordering::Release);
        self.joined_floor.store(floor, Ordering::Release);
    }

    pub(crate) fn add_demand(&self, n: u64) {
        let current = self.demand.load(Ordering::Acquire);
        self.demand.store(add_demand(current, n), Ordering::Release);
    }

    pub(crate) fn joined_floor(&self) -> u64 {
        self.joined_floor.load(Ordering::Acquire)
    }

    /// Mark terminated; only the first caller wins and may deliver the
    /// terminal signal.
    pub(crate) fn try_terminate(&self) -> bool {
        !self.terminated.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn post_cancel(&self) {
        if let Some(leaf) = self.weak_self.upgrade() {
            let cancel_upstream = self.cancel_upstream;
            self.epoch.enqueue_and_process(SubscriptionEvent::Cancel {
                leaf,
                cancel_upstream,
            });
        }
    }
}

impl<T: Clone + Send + 'static> DemandEntry for Leaf<T> {
    fn demand(&self) -> u64 {
        self.demand.load(Ordering::Acquire)
    }

    fn queue_index(&self) -> usize {
        self.queue_index.load(Ordering::Acquire)
    }

    fn set_queue_index(&self, index: usize) {
        self.queue_index.store(index, Ordering::Release);
    }
}

impl<T: Clone + Send + 'static> Subscription for Leaf<T> {
    fn request(&self, n: u64) {
        if !is_demand_valid(n) {
            // Invalid demand fails this subscriber alone, immediately and
            // from the caller's thread; the cancel event then cleans up its
            // share of the fan-out state.
            if self.try_terminate() {
                self.raw().on_error(ManifoldError::invalid_demand(n));
            }
            self.post_cancel();
            return;
        }
        if self.is_terminated() || self.is_cancelled() {
            return;
        }
        if let Some(leaf) = self.weak_self.upgrade() {
            self.epoch
                .enqueue_and_process(SubscriptionEvent::Request { leaf, n });
        }
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.post_cancel();
    }
}
