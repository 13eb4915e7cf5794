// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::ManifoldError;
use crate::subscription::Subscription;
use std::sync::Arc;

/// The receiver of a publisher's signals.
///
/// ## Contract
///
/// - `on_subscribe` is invoked exactly once, before any other signal.
/// - `on_next` is invoked only between `on_subscribe` and the terminal
///   signal, and only up to the cumulative amount of demand the subscriber
///   has requested through its [`Subscription`].
/// - At most one terminal signal (`on_error` or `on_complete`) is delivered
///   per subscribe.
/// - For a given subscription these methods are invoked by a single thread at
///   a time; implementations manage any interior mutability they need.
///
/// Implementations must not block. A callback that panics is caught at the
/// dispatch boundary and converted into an error signal or a cancellation for
/// this subscriber only.
pub trait Subscriber<T>: Send + Sync {
    /// Receives the control handle for this subscribe.
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>);

    /// Receives the next item.
    fn on_next(&self, item: T);

    /// Receives the terminal error signal.
    fn on_error(&self, error: ManifoldError);

    /// Receives the terminal completion signal.
    fn on_complete(&self);
}
