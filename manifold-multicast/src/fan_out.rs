// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! One multicast epoch: the shared state between a single upstream
//! subscription and the group of subscribers fanned out from it.
//!
//! Item dispatch is wait-free for readers: the subscriber array lives in an
//! [`ArcSwap`] snapshot that `dispatch` loads without locking. Structural
//! mutations (subscribe, request, cancel) are posted as events to an
//! unbounded queue and drained by whichever thread wins the [`EventLock`],
//! so the demand queue and the copy-on-write array are only ever touched by
//! one thread at a time.

use crate::config::MulticastConfig;
use crate::demand_queue::{DemandEntry, DemandQueue, NOT_IN_QUEUE};
use crate::event_lock::EventLock;
use crate::leaf::Leaf;
use crate::multicast::Inner;
use crate::terminal_sentinel::TerminalSentinel;
use arc_swap::ArcSwap;
use crossbeam_queue::SegQueue;
use manifold_core::demand::MAX_DEMAND;
use manifold_core::{
    CompletionObserver, Context, DelayedSubscription, ManifoldError, Subscriber, Subscription,
    TerminalSignal,
};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// The subscriber array, or the sentinel that replaced it on termination.
pub(crate) enum Snapshot<T: Clone + Send + 'static> {
    Live(Vec<Arc<Leaf<T>>>),
    Terminated(TerminalSentinel),
}

/// A structural mutation posted to the serialization queue.
pub(crate) enum SubscriptionEvent<T: Clone + Send + 'static> {
    Subscribe { leaf: Arc<Leaf<T>>, context: Context },
    Request { leaf: Arc<Leaf<T>>, n: u64 },
    Cancel { leaf: Arc<Leaf<T>>, cancel_upstream: bool },
}

/// Demand arbitration state, only touched by the event-lock holder.
struct DemandState<T: Clone + Send + 'static> {
    queue: DemandQueue<Leaf<T>>,
    /// Cumulative amount already requested from the upstream. The group never
    /// requests more than its slowest subscriber authorized, so this floor
    /// only moves when the heap minimum rises above it.
    requested_floor: u64,
}

pub(crate) struct FanOutState<T: Clone + Send + 'static> {
    owner: Weak<Inner<T>>,
    config: Arc<MulticastConfig>,
    snapshot: ArcSwap<Snapshot<T>>,
    demand: Mutex<DemandState<T>>,
    events: SegQueue<SubscriptionEvent<T>>,
    lock: EventLock,
    /// Number of subscribe attempts routed to this epoch, rejected included.
    subscribe_count: AtomicUsize,
    upstream: DelayedSubscription,
    upstream_triggered: AtomicBool,
    /// Set when a replacement epoch has been installed; events still queued
    /// here are re-routed to the owner.
    retired: AtomicBool,
    weak_self: Weak<FanOutState<T>>,
}

impl<T: Clone + Send + 'static> FanOutState<T> {
    pub(crate) fn new(owner: Weak<Inner<T>>, config: Arc<MulticastConfig>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            owner,
            config,
            snapshot: ArcSwap::from_pointee(Snapshot::Live(Vec::new())),
            demand: Mutex::new(DemandState {
                queue: DemandQueue::new(),
                requested_floor: 0,
            }),
            events: SegQueue::new(),
            lock: EventLock::new(),
            subscribe_count: AtomicUsize::new(0),
            upstream: DelayedSubscription::new(),
            upstream_triggered: AtomicBool::new(false),
            retired: AtomicBool::new(false),
            weak_self: weak_self.clone(),
        })
    }

    /// Ordinal (1-based) for the next subscribe attempt on this epoch.
    pub(crate) fn next_ordinal(&self) -> usize {
        self.subscribe_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Number of live subscribers currently in the fan-out array.
    pub(crate) fn live_count(&self) -> usize {
        match &*self.snapshot.load_full() {
            Snapshot::Live(leaves) => leaves.len(),
            Snapshot::Terminated(_) => 0,
        }
    }

    pub(crate) fn is_terminated(&self) -> bool {
        matches!(&*self.snapshot.load_full(), Snapshot::Terminated(_))
    }

    pub(crate) fn enqueue_and_process(&self, event: SubscriptionEvent<T>) {
        self.events.push(event);
        self.process_events();
    }

    /// Drain the event queue if no other thread is already doing so.
    ///
    /// Panics raised while applying events (protocol violations, terminal
    /// replay failures) are collected and re-raised only after the lock has
    /// been cleanly released, so a broken subscriber can never leave the
    /// queue wedged.
    fn process_events(&self) {
        if !self.lock.try_acquire() {
            return;
        }
        let mut failures = Vec::new();
        loop {
            while let Some(event) = self.events.pop() {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.apply(event)))
                {
                    failures.push(ManifoldError::from_panic(payload));
                }
            }
            if self.lock.release() {
                break;
            }
        }
        if let Some(error) = ManifoldError::aggregate(failures) {
            crate::error!("multicast: subscription event processing failed: {error}");
            panic!("subscription event processing failed: {error}");
        }
    }

    fn apply(&self, event: SubscriptionEvent<T>) {
        match event {
            SubscriptionEvent::Subscribe { leaf, context } => {
                self.apply_subscribe(leaf, context);
            }
            SubscriptionEvent::Request { leaf, n } => self.apply_request(&leaf, n),
            SubscriptionEvent::Cancel {
                leaf,
                cancel_upstream,
            } => self.apply_cancel(&leaf, cancel_upstream),
        }
    }

    /// Insert the leaf into the live array, seed its demand, and deliver
    /// `on_subscribe`.
    ///
    /// The insertion is visible to concurrent terminal delivery before
    /// `on_subscribe` runs, so a terminal racing in from another thread can
    /// reach this subscriber first. Single-threaded callers never observe
    /// that inversion.
    fn apply_subscribe(&self, leaf: Arc<Leaf<T>>, context: Context) {
        if self.retired.load(Ordering::Acquire) {
            // A fresh epoch replaced this one while the event sat in the
            // queue; hand the subscriber over to it.
            if let Some(inner) = self.owner.upgrade() {
                inner.subscribe_with(leaf.raw().clone(), context);
            }
            return;
        }
        loop {
            let current = self.snapshot.load_full();
            let leaves = match &*current {
                Snapshot::Terminated(sentinel) => {
                    self.deliver_terminal_to_late(&leaf, sentinel);
                    return;
                }
                Snapshot::Live(leaves) => leaves,
            };
            let mut next = Vec::with_capacity(leaves.len() + 1);
            next.extend(leaves.iter().cloned());
            next.push(leaf.clone());
            let updated = Arc::new(Snapshot::Live(next));
            let previous = self.snapshot.compare_and_swap(&current, updated);
            if Arc::ptr_eq(&*previous, &current) {
                break;
            }
        }
        {
            // Seed at the current floor so the newcomer does not drag the
            // group minimum below what was already requested upstream.
            let mut demand = self.demand.lock();
            let floor = demand.queue.min_demand().unwrap_or(demand.requested_floor);
            leaf.seed(floor);
            demand.queue.add(leaf.clone());
        }
        let subscription: Arc<dyn Subscription> = leaf.clone();
        if let Err(payload) =
            panic::catch_unwind(AssertUnwindSafe(|| leaf.wrapped().on_subscribe(subscription)))
        {
            let error = ManifoldError::from_panic(payload);
            crate::error!("multicast: on_subscribe panicked, detaching subscriber: {error}");
            self.apply_cancel(&leaf, leaf.cancel_upstream());
            if leaf.try_terminate() {
                let raw = leaf.raw().clone();
                if panic::catch_unwind(AssertUnwindSafe(|| raw.on_error(error))).is_err() {
                    crate::warn!("multicast: on_error panicked while reporting an on_subscribe panic");
                }
            }
        }
        if self.retired.load(Ordering::Acquire) {
            return;
        }
        // The Nth accepted subscribe performs the single upstream subscribe,
        // carrying that subscriber's captured context.
        if leaf.ordinal() == self.config.min_subscribers
            && !self.upstream_triggered.swap(true, Ordering::AcqRel)
        {
            self.subscribe_upstream(context);
        }
    }

    fn subscribe_upstream(&self, context: Context) {
        let (Some(inner), Some(epoch)) = (self.owner.upgrade(), self.weak_self.upgrade()) else {
            return;
        };
        let subscriber: Arc<dyn Subscriber<T>> = Arc::new(FanOutSubscriber { epoch });
        inner.source().subscribe_with(subscriber, context);
    }

    /// A subscriber joined after termination: give it an inert subscription
    /// and replay the recorded terminal signal.
    fn deliver_terminal_to_late(&self, leaf: &Arc<Leaf<T>>, sentinel: &TerminalSentinel) {
        if !leaf.try_terminate() {
            return;
        }
        let subscription: Arc<dyn Subscription> = leaf.clone();
        match panic::catch_unwind(AssertUnwindSafe(|| leaf.wrapped().on_subscribe(subscription))) {
            Ok(()) => sentinel.replay(leaf.raw().as_ref()),
            Err(payload) => {
                let error = ManifoldError::from_panic(payload);
                crate::error!("multicast: on_subscribe panicked for a late subscriber: {error}");
                let raw = leaf.raw().clone();
                if panic::catch_unwind(AssertUnwindSafe(|| raw.on_error(error))).is_err() {
                    crate::warn!("multicast: on_error panicked while reporting an on_subscribe panic");
                }
            }
        }
    }

    fn apply_request(&self, leaf: &Arc<Leaf<T>>, n: u64) {
        if leaf.is_terminated() || leaf.is_cancelled() {
            return;
        }
        let delta = {
            let mut demand = self.demand.lock();
            if leaf.queue_index() == NOT_IN_QUEUE {
                // Detached (cancel or terminal) while this event was queued.
                return;
            }
            leaf.add_demand(n);
            demand.queue.priority_changed(leaf);
            Self::flush_floor(&mut demand)
        };
        if delta > 0 {
            self.request_upstream(delta);
        }
    }

    fn apply_cancel(&self, leaf: &Arc<Leaf<T>>, cancel_upstream: bool) {
        let emptied = loop {
            let current = self.snapshot.load_full();
            let leaves = match &*current {
                // The terminal sweep already detached everyone.
                Snapshot::Terminated(_) => return,
                Snapshot::Live(leaves) => leaves,
            };
            let Some(position) = leaves.iter().position(|l| Arc::ptr_eq(l, leaf)) else {
                return;
            };
            let mut next = leaves.clone();
            next.remove(position);
            let emptied = next.is_empty();
            let updated = Arc::new(Snapshot::Live(next));
            let previous = self.snapshot.compare_and_swap(&current, updated);
            if Arc::ptr_eq(&*previous, &current) {
                break emptied;
            }
        };
        let delta = {
            let mut demand = self.demand.lock();
            debug_assert!(
                leaf.joined_floor() <= demand.requested_floor,
                "leaf joined above the requested floor"
            );
            demand.queue.remove(leaf);
            // Removing the slowest subscriber can raise the group minimum.
            Self::flush_floor(&mut demand)
        };
        if delta > 0 {
            self.request_upstream(delta);
        }
        if emptied && cancel_upstream {
            self.upstream.cancel();
            self.retire_and_reset();
        }
    }

    /// Raise `requested_floor` to the current heap minimum, returning the
    /// delta that must now be requested upstream.
    fn flush_floor(demand: &mut DemandState<T>) -> u64 {
        let floor = demand.queue.min_demand().unwrap_or(demand.requested_floor);
        if floor > demand.requested_floor {
            let delta = floor - demand.requested_floor;
            demand.requested_floor = floor;
            delta
        } else {
            0
        }
    }

    /// Forward `delta` upstream, split into batches of at most the configured
    /// demand ceiling. Total demand is conserved; the effectively-unbounded
    /// [`MAX_DEMAND`] passes through as a single call.
    fn request_upstream(&self, mut delta: u64) {
        if delta == MAX_DEMAND {
            self.upstream.request(MAX_DEMAND);
            return;
        }
        let ceiling = self.config.demand_ceiling.max(1);
        while delta > 0 {
            let chunk = delta.min(ceiling);
            self.upstream.request(chunk);
            delta -= chunk;
        }
    }

    pub(crate) fn attach_upstream(&self, subscription: Arc<dyn Subscription>) {
        self.upstream.set(subscription);
    }

    /// Deliver one upstream item to every live subscriber.
    ///
    /// A panicking `on_next` fails only that subscriber: it is errored with
    /// the panic cause and detached, and delivery continues with its peers.
    ///
    /// # Panics
    ///
    /// Panics if the upstream emits after its terminal signal.
    pub(crate) fn dispatch(&self, item: T) {
        let snapshot = self.snapshot.load_full();
        let leaves = match &*snapshot {
            Snapshot::Terminated(sentinel) => sentinel.deny_on_next(),
            Snapshot::Live(leaves) => leaves,
        };
        for leaf in leaves {
            if leaf.is_terminated() || leaf.is_cancelled() {
                continue;
            }
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| leaf.raw().on_next(item.clone())));
            if let Err(payload) = result {
                let error = ManifoldError::from_panic(payload);
                crate::error!("multicast: on_next panicked, detaching subscriber: {error}");
                if leaf.try_terminate() {
                    let raw = leaf.raw().clone();
                    if panic::catch_unwind(AssertUnwindSafe(|| raw.on_error(error))).is_err() {
                        crate::warn!("multicast: on_error panicked while reporting an on_next panic");
                    }
                }
                self.enqueue_and_process(SubscriptionEvent::Cancel {
                    leaf: leaf.clone(),
                    cancel_upstream: leaf.cancel_upstream(),
                });
            }
        }
    }

    /// Record the upstream's terminal signal and fan it out.
    ///
    /// The sentinel is installed first so subscribers arriving concurrently
    /// observe the terminal instead of a half-swept array. Panics from
    /// terminal callbacks are aggregated and re-raised once every subscriber
    /// has been notified.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate terminal signal, or re-raises aggregated
    /// subscriber callback panics.
    pub(crate) fn terminate(&self, signal: TerminalSignal) {
        let sentinel = Arc::new(Snapshot::Terminated(TerminalSentinel::new(signal.clone())));
        let previous = self.snapshot.swap(sentinel);
        let leaves = match &*previous {
            Snapshot::Terminated(existing) => existing.deny_terminal(),
            Snapshot::Live(leaves) => leaves,
        };
        {
            let mut demand = self.demand.lock();
            demand.queue.clear();
        }
        let mut failures = Vec::new();
        for leaf in leaves {
            if !leaf.try_terminate() {
                continue;
            }
            if let Err(payload) =
                panic::catch_unwind(AssertUnwindSafe(|| signal.deliver(leaf.raw().as_ref())))
            {
                failures.push(ManifoldError::from_panic(payload));
            }
        }
        self.arm_resubscribe(&signal);
        if let Some(error) = ManifoldError::aggregate(failures) {
            panic!("terminal delivery failed: {error}");
        }
    }

    /// Ask the configured policy whether this terminal permits a reset, and
    /// arm the reset on the returned completable.
    fn arm_resubscribe(&self, signal: &TerminalSignal) {
        let hook = &self.config.terminal_resubscribe;
        let completable = match panic::catch_unwind(AssertUnwindSafe(|| hook(signal))) {
            Ok(completable) => completable,
            Err(payload) => {
                let error = ManifoldError::from_panic(payload);
                crate::error!(
                    "multicast: resubscribe hook panicked, staying terminated: {error}"
                );
                return;
            }
        };
        if let Some(epoch) = self.weak_self.upgrade() {
            completable.subscribe(Arc::new(ResetObserver { epoch }));
        }
    }

    /// Retire this epoch and install a fresh one on the owner, so future
    /// subscribers start a new upstream lifecycle.
    pub(crate) fn retire_and_reset(&self) {
        if self.retired.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(inner) = self.owner.upgrade() {
            inner.reset_from(self);
        }
    }
}

/// The single subscriber handed to the upstream source on behalf of the
/// whole group.
pub(crate) struct FanOutSubscriber<T: Clone + Send + 'static> {
    epoch: Arc<FanOutState<T>>,
}

impl<T: Clone + Send + 'static> Subscriber<T> for FanOutSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.epoch.attach_upstream(subscription);
    }

    fn on_next(&self, item: T) {
        self.epoch.dispatch(item);
    }

    fn on_error(&self, error: ManifoldError) {
        self.epoch.terminate(TerminalSignal::Error(error));
    }

    fn on_complete(&self) {
        self.epoch.terminate(TerminalSignal::Complete);
    }
}

/// Resets the epoch when the resubscribe gate completes.
struct ResetObserver<T: Clone + Send + 'static> {
    epoch: Arc<FanOutState<T>>,
}

impl<T: Clone + Send + 'static> CompletionObserver for ResetObserver<T> {
    fn on_complete(&self) {
        self.epoch.retire_and_reset();
    }

    fn on_error(&self, error: ManifoldError) {
        crate::warn!("multicast: resubscribe gate failed, staying terminated: {error}");
    }
}
