// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::multicast::MulticastPublisher;
use manifold_core::completion::never;
use manifold_core::demand::MAX_DEMAND;
use manifold_core::{Completable, Publisher, TerminalSignal};
use std::sync::Arc;

/// Maps a terminal signal to the [`Completable`] whose completion permits a
/// fresh epoch (resubscription) after the multicast source terminated.
pub type ResubscribeHook = dyn Fn(&TerminalSignal) -> Arc<dyn Completable> + Send + Sync;

pub(crate) struct MulticastConfig {
    pub(crate) min_subscribers: usize,
    pub(crate) exactly_min_subscribers: bool,
    pub(crate) cancel_upstream: bool,
    pub(crate) demand_ceiling: u64,
    pub(crate) terminal_resubscribe: Box<ResubscribeHook>,
}

impl Default for MulticastConfig {
    fn default() -> Self {
        Self {
            min_subscribers: 1,
            exactly_min_subscribers: false,
            cancel_upstream: true,
            demand_ceiling: MAX_DEMAND,
            // Terminals are sticky by default: late subscribers get the
            // recorded signal replayed until a hook opts into resetting.
            terminal_resubscribe: Box::new(|_| never()),
        }
    }
}

/// Builder for a [`MulticastPublisher`].
///
/// Obtained via [`MulticastPublisher::builder`]. All settings have defaults:
/// one subscriber triggers the upstream subscribe, extra subscribers are
/// allowed, a full cancellation propagates upstream, demand batches are
/// unbounded, and a terminated source stays terminated.
pub struct MulticastBuilder<T: Clone + Send + 'static> {
    source: Arc<dyn Publisher<T>>,
    config: MulticastConfig,
}

impl<T: Clone + Send + 'static> MulticastBuilder<T> {
    pub(crate) fn new(source: Arc<dyn Publisher<T>>) -> Self {
        Self {
            source,
            config: MulticastConfig::default(),
        }
    }

    /// Number of subscribers that must attach before the single upstream
    /// subscribe is performed.
    ///
    /// # Panics
    ///
    /// Panics if `min` is zero.
    #[must_use]
    pub fn min_subscribers(mut self, min: usize) -> Self {
        assert!(min >= 1, "min_subscribers must be at least 1");
        self.config.min_subscribers = min;
        self
    }

    /// Reject subscribers beyond `min_subscribers` with an immediate
    /// [`RejectedSubscribe`](manifold_core::ManifoldError::RejectedSubscribe)
    /// error instead of accepting an unbounded number.
    #[must_use]
    pub fn exactly_min_subscribers(mut self, exactly: bool) -> Self {
        self.config.exactly_min_subscribers = exactly;
        self
    }

    /// Whether cancellation of the last remaining subscriber cancels the
    /// upstream subscription and resets the epoch for resubscription.
    #[must_use]
    pub fn cancel_upstream(mut self, cancel: bool) -> Self {
        self.config.cancel_upstream = cancel;
        self
    }

    /// Upper bound on any individual `request` batch issued upstream.
    ///
    /// Total demand is conserved; larger deltas are split into multiple
    /// calls. Acts as a hint bounding how much buffering a burst can ask of
    /// the source at once.
    ///
    /// # Panics
    ///
    /// Panics if `ceiling` is zero.
    #[must_use]
    pub fn demand_ceiling(mut self, ceiling: u64) -> Self {
        assert!(ceiling >= 1, "demand_ceiling must be at least 1");
        self.config.demand_ceiling = ceiling;
        self
    }

    /// Install the resubscribe policy invoked after the source terminates.
    ///
    /// The returned completable's completion resets the multicast to a fresh
    /// epoch; its failure (or a panicking hook) is logged and treated as
    /// "never reset".
    #[must_use]
    pub fn terminal_resubscribe(
        mut self,
        hook: impl Fn(&TerminalSignal) -> Arc<dyn Completable> + Send + Sync + 'static,
    ) -> Self {
        self.config.terminal_resubscribe = Box::new(hook);
        self
    }

    /// Build the multicast publisher.
    #[must_use]
    pub fn build(self) -> MulticastPublisher<T> {
        MulticastPublisher::from_parts(self.source, self.config)
    }
}
