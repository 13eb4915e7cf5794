// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! End-to-end tests exercising the umbrella crate surface: a finite source
//! shared through the multicast operator, driven purely via re-exports.

use manifold_rx::{
    completed, Context, ManifoldError, MulticastPublisher, Publisher, Subscriber, Subscription,
    TerminalSignal,
};
use manifold_test_utils::{RecordingSubscriber, Signal};
use parking_lot::Mutex;
use std::sync::Arc;

/// A cold source that replays a fixed vector, item by requested item, then
/// completes.
struct VecSource {
    items: Vec<i32>,
}

struct VecSubscription {
    subscriber: Arc<dyn Subscriber<i32>>,
    items: Vec<i32>,
    position: Mutex<usize>,
}

impl Subscription for VecSubscription {
    fn request(&self, n: u64) {
        for _ in 0..n {
            let next = {
                let mut position = self.position.lock();
                if *position > self.items.len() {
                    return;
                }
                let index = *position;
                *position += 1;
                index
            };
            if next < self.items.len() {
                self.subscriber.on_next(self.items[next]);
            } else {
                self.subscriber.on_complete();
                return;
            }
        }
    }

    fn cancel(&self) {
        *self.position.lock() = self.items.len() + 1;
    }
}

impl Publisher<i32> for VecSource {
    fn subscribe_with(&self, subscriber: Arc<dyn Subscriber<i32>>, _context: Context) {
        let subscription = Arc::new(VecSubscription {
            subscriber: subscriber.clone(),
            items: self.items.clone(),
            position: Mutex::new(0),
        });
        subscriber.on_subscribe(subscription);
    }
}

fn shared_one_two_three() -> MulticastPublisher<i32> {
    MulticastPublisher::builder(Arc::new(VecSource {
        items: vec![1, 2, 3],
    }) as Arc<dyn Publisher<i32>>)
    .min_subscribers(2)
    .build()
}

#[test]
fn test_two_subscribers_replay_a_finite_source() {
    let shared = shared_one_two_three();
    let first = RecordingSubscriber::<i32>::new();
    let second = RecordingSubscriber::<i32>::new();
    shared.subscribe(first.clone());
    shared.subscribe(second.clone());

    first.request(10);
    second.request(10);

    for subscriber in [&first, &second] {
        assert_eq!(subscriber.items(), vec![1, 2, 3]);
        assert!(subscriber.is_completed());
    }
    assert!(shared.is_terminated());
}

#[test]
fn test_slow_subscriber_throttles_the_group() {
    let shared = shared_one_two_three();
    let fast = RecordingSubscriber::<i32>::new();
    let slow = RecordingSubscriber::<i32>::new();
    shared.subscribe(fast.clone());
    shared.subscribe(slow.clone());

    fast.request(10);
    assert!(fast.items().is_empty());

    slow.request(1);
    assert_eq!(fast.items(), vec![1]);
    assert_eq!(slow.items(), vec![1]);

    slow.request(10);
    assert_eq!(fast.items(), vec![1, 2, 3]);
    assert_eq!(slow.items(), vec![1, 2, 3]);
}

#[test]
fn test_signal_order_is_subscribe_items_terminal() {
    let shared = shared_one_two_three();
    let first = RecordingSubscriber::<i32>::new();
    let second = RecordingSubscriber::<i32>::new();
    shared.subscribe(first.clone());
    shared.subscribe(second.clone());
    first.request(10);
    second.request(10);

    let signals = first.signals();
    assert_eq!(signals.len(), 5);
    assert!(matches!(signals[0], Signal::Subscribed));
    assert!(matches!(signals[1], Signal::Next(1)));
    assert!(matches!(signals[2], Signal::Next(2)));
    assert!(matches!(signals[3], Signal::Next(3)));
    assert!(matches!(signals[4], Signal::Complete));
}

#[test]
fn test_resubscribe_policy_reopens_a_completed_source() {
    let shared = MulticastPublisher::builder(Arc::new(VecSource { items: vec![7] })
        as Arc<dyn Publisher<i32>>)
    .terminal_resubscribe(|signal: &TerminalSignal| {
        assert!(signal.is_complete());
        completed()
    })
    .build();

    let first = RecordingSubscriber::<i32>::new();
    shared.subscribe(first.clone());
    first.request(5);
    assert_eq!(first.items(), vec![7]);
    assert!(first.is_completed());

    // The policy reset the operator, so a new subscriber replays the source
    // from the start instead of receiving the old terminal.
    let second = RecordingSubscriber::<i32>::new();
    shared.subscribe(second.clone());
    second.request(5);
    assert_eq!(second.items(), vec![7]);
    assert!(second.is_completed());
}

#[test]
fn test_error_helpers_round_trip_through_the_facade() {
    let error = ManifoldError::invalid_demand(0);
    assert!(matches!(
        error,
        ManifoldError::InvalidDemand { requested: 0 }
    ));
    let signal = TerminalSignal::Error(error);
    assert!(!signal.is_complete());
    assert!(signal.cause().is_some());
}
