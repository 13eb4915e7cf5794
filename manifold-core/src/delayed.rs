// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Demand accumulation for not-yet-available upstream subscriptions.

use crate::demand::add_demand;
use crate::subscription::Subscription;
use parking_lot::Mutex;
use std::sync::Arc;

struct DelayedState {
    target: Option<Arc<dyn Subscription>>,
    pending: u64,
    cancelled: bool,
}

/// A [`Subscription`] facade for an upstream that has not subscribed yet.
///
/// Operators that aggregate many downstream subscriptions into one upstream
/// subscription need a single coherent stream of `request`/`cancel` calls
/// toward the source, even before the source has delivered its real
/// subscription. `DelayedSubscription` buffers demand (saturating) and a
/// cancel flag until [`set`](DelayedSubscription::set) provides the real
/// subscription, then flushes and forwards everything afterwards.
///
/// # Examples
///
/// ```
/// use manifold_core::{DelayedSubscription, Subscription};
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use std::sync::Arc;
///
/// struct Recording(AtomicU64);
/// impl Subscription for Recording {
///     fn request(&self, n: u64) {
///         self.0.fetch_add(n, Ordering::SeqCst);
///     }
///     fn cancel(&self) {}
/// }
///
/// let delayed = DelayedSubscription::new();
/// delayed.request(3);
/// delayed.request(4);
///
/// let upstream = Arc::new(Recording(AtomicU64::new(0)));
/// delayed.set(upstream.clone());
/// // Buffered demand is flushed as a single request.
/// assert_eq!(upstream.0.load(Ordering::SeqCst), 7);
///
/// delayed.request(2);
/// assert_eq!(upstream.0.load(Ordering::SeqCst), 9);
/// ```
pub struct DelayedSubscription {
    state: Mutex<DelayedState>,
}

impl DelayedSubscription {
    /// Creates a delayed subscription with no target and no buffered demand.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DelayedState {
                target: None,
                pending: 0,
                cancelled: false,
            }),
        }
    }

    /// Provide the real upstream subscription.
    ///
    /// Buffered demand is flushed as one `request` call; a buffered cancel is
    /// forwarded instead. Setting a second target is a protocol violation of
    /// the single-upstream invariant and panics.
    ///
    /// # Panics
    ///
    /// Panics if a target was already set.
    pub fn set(&self, subscription: Arc<dyn Subscription>) {
        let (flush, cancel) = {
            let mut state = self.state.lock();
            assert!(
                state.target.is_none(),
                "DelayedSubscription target set twice"
            );
            state.target = Some(subscription.clone());
            let flush = std::mem::take(&mut state.pending);
            (flush, state.cancelled)
        };
        // Forward outside the lock; the upstream may emit synchronously.
        if cancel {
            subscription.cancel();
        } else if flush > 0 {
            subscription.request(flush);
        }
    }

    /// Returns `true` once `cancel` has been observed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }
}

impl Subscription for DelayedSubscription {
    fn request(&self, n: u64) {
        let target = {
            let mut state = self.state.lock();
            if state.cancelled {
                return;
            }
            match &state.target {
                Some(target) => Some(target.clone()),
                None => {
                    state.pending = add_demand(state.pending, n);
                    None
                }
            }
        };
        if let Some(target) = target {
            target.request(n);
        }
    }

    fn cancel(&self) {
        let target = {
            let mut state = self.state.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            state.pending = 0;
            state.target.clone()
        };
        if let Some(target) = target {
            target.cancel();
        }
    }
}

impl Default for DelayedSubscription {
    fn default() -> Self {
        Self::new()
    }
}
