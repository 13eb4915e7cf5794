// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The demand/cancel control handle given to a [`Subscriber`].
//!
//! [`Subscriber`]: crate::Subscriber

/// Control handle through which a subscriber paces and terminates delivery.
///
/// ## Contract
///
/// - `request(n)` with `n > 0` authorizes the publisher to deliver up to `n`
///   further items. `n == 0` is invalid demand and is routed to the offending
///   subscriber's `on_error` channel; it never corrupts shared state.
/// - Demand accumulates saturatingly: repeated requests never wrap.
/// - `cancel` is idempotent and cooperative: it guarantees eventual cessation
///   of delivery, but an `on_next` already in flight may still complete.
///
/// Methods may be invoked from any thread at any time, including re-entrantly
/// from within the subscriber's own `on_next`.
pub trait Subscription: Send + Sync {
    /// Request `n` more items from the publisher.
    fn request(&self, n: u64);

    /// Stop delivery to the associated subscriber.
    fn cancel(&self);
}

/// A no-op subscription.
///
/// Handed to subscribers that will never receive items: rejected subscribers
/// and late subscribers that only receive a replayed terminal signal. Keeps
/// the `on_subscribe`-before-terminal ordering guarantee intact without
/// routing demand anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySubscription;

impl Subscription for EmptySubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}
