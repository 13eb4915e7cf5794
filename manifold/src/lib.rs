// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Manifold
//!
//! A push-model reactive streams library: publishers deliver items to
//! subscribers under an explicit demand protocol, and the multicast operator
//! shares one upstream subscription among many subscribers while requesting
//! no more than the slowest of them has authorized.
//!
//! ## Overview
//!
//! The building blocks live in `manifold-core`:
//!
//! - [`Publisher`] / [`Subscriber`] / [`Subscription`] — the push contracts:
//!   a subscriber receives `on_subscribe`, then up to as many `on_next` calls
//!   as it requested, then exactly one terminal (`on_complete`/`on_error`);
//! - [`Completable`] — the 0-item analogue, used for lifecycle plumbing;
//! - [`Context`] — explicit capture of subscribe-time request metadata.
//!
//! The flagship operator is [`MulticastPublisher`], which lifts a
//! single-subscriber source into a shared one with group backpressure,
//! per-subscriber fault isolation, terminal replay for late subscribers, and
//! an optional resubscribe policy.
//!
//! ## Quick Start
//!
//! ```rust
//! use manifold_rx::{Context, MulticastPublisher, Publisher, Subscriber, Subscription};
//! use std::sync::Arc;
//!
//! // A source that emits one greeting per requested item.
//! struct Greeter;
//!
//! impl Publisher<String> for Greeter {
//!     fn subscribe_with(&self, subscriber: Arc<dyn Subscriber<String>>, _context: Context) {
//!         struct Greet(Arc<dyn Subscriber<String>>);
//!         impl Subscription for Greet {
//!             fn request(&self, n: u64) {
//!                 for _ in 0..n.min(3) {
//!                     self.0.on_next("hello".to_string());
//!                 }
//!             }
//!             fn cancel(&self) {}
//!         }
//!         let subscription = Arc::new(Greet(subscriber.clone()));
//!         subscriber.on_subscribe(subscription);
//!     }
//! }
//!
//! let shared = MulticastPublisher::new(Arc::new(Greeter));
//! // shared.subscribe(...) as many times as needed; the source is
//! // subscribed once and every subscriber sees every item.
//! ```

// Re-export the core contracts
pub use manifold_core::{
    completed, failed, never, Completable, CompletionCell, CompletionObserver, Context,
    DelayedSubscription, EmptySubscription, ManifoldError, Publisher, Result, Subscriber,
    Subscription, TerminalSignal,
};

// Re-export the multicast operator
pub use manifold_multicast::{MulticastBuilder, MulticastPublisher, ResubscribeHook};
