// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Core contracts for the Manifold push-model reactive streams library.
//!
//! This crate defines the four abstract contracts every Manifold source and
//! operator is built from:
//!
//! - [`Publisher`] — a push-based asynchronous source of `0..N` items plus one
//!   terminal signal, with single-active-subscriber default semantics.
//! - [`Subscriber`] — the receiver of a publisher's signals.
//! - [`Subscription`] — the demand/cancel control handle handed to a
//!   subscriber.
//! - [`Completable`] — the 0-item analogue of a publisher, used for lifecycle
//!   plumbing such as resubscribe policies.
//!
//! It also carries the supporting types those contracts rely on: the root
//! [`ManifoldError`] type, the [`TerminalSignal`] carried by terminated
//! sources, the explicit [`Context`] capture mechanism, the
//! [`DelayedSubscription`] demand accumulator, and saturating demand
//! arithmetic in [`demand`].
//!
//! No operator implementations live here; see `manifold-multicast` for the
//! fan-out engine built on these contracts.

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod completable;
pub mod completion;
pub mod context;
pub mod delayed;
pub mod demand;
pub mod error;
pub mod publisher;
pub mod subscriber;
pub mod subscription;
pub mod terminal;

pub use self::completable::{Completable, CompletionObserver};
pub use self::completion::{completed, failed, never, CompletionCell};
pub use self::context::{Context, ContextPreservingSubscriber};
pub use self::delayed::DelayedSubscription;
pub use self::error::{ManifoldError, Result};
pub use self::publisher::Publisher;
pub use self::subscriber::Subscriber;
pub use self::subscription::{EmptySubscription, Subscription};
pub use self::terminal::TerminalSignal;
