// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::ManifoldError;
use std::sync::Arc;

/// The receiver of a [`Completable`]'s single terminal signal.
///
/// Exactly one of `on_complete` / `on_error` is invoked per subscribe.
pub trait CompletionObserver: Send + Sync {
    /// The completable finished successfully.
    fn on_complete(&self);

    /// The completable failed with the given cause.
    fn on_error(&self, error: ManifoldError);
}

/// A 0-item analogue of [`Publisher`]: no items, one terminal signal.
///
/// Used for lifecycle plumbing such as the multicast resubscribe policy,
/// where the interesting event is *when* something finishes, not what it
/// produced.
///
/// [`Publisher`]: crate::Publisher
pub trait Completable: Send + Sync {
    /// Subscribe an observer to this completable's terminal signal.
    ///
    /// Sources that have already terminated deliver the signal synchronously
    /// from within this call.
    fn subscribe(&self, observer: Arc<dyn CompletionObserver>);
}
