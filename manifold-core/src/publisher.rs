// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::context::Context;
use crate::subscriber::Subscriber;
use std::sync::Arc;

/// A push-based asynchronous source of `0..N` items plus one terminal signal.
///
/// The default semantics are single-active-subscriber: a publisher owns at
/// most one live [`Subscription`](crate::Subscription) per epoch, and a second
/// concurrent subscribe is source-defined behavior. Operators such as the
/// multicast fan-out lift a single-subscriber source into a shared one.
///
/// `subscribe` is the public entry point; `subscribe_with` is the
/// `handle_subscribe` hook operators override. The [`Context`] argument is the
/// explicit replacement for ambient context capture: callers that carry
/// request-scoped values pass them here, and operators thread them through to
/// wherever the subscribe chain terminates.
pub trait Publisher<T>: Send + Sync {
    /// Subscribe with an empty context.
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        self.subscribe_with(subscriber, Context::default());
    }

    /// Subscribe, capturing the caller's context for this subscribe call.
    fn subscribe_with(&self, subscriber: Arc<dyn Subscriber<T>>, context: Context);
}
