// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use criterion::{BenchmarkId, Criterion, Throughput};
use manifold_core::{Context, Publisher, Subscriber, Subscription};
use manifold_multicast::MulticastPublisher;
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A source that synchronously emits one `u64` per requested item.
struct CountingSource;

struct CountingSubscription {
    subscriber: Arc<dyn Subscriber<u64>>,
    next: AtomicU64,
}

impl Subscription for CountingSubscription {
    fn request(&self, n: u64) {
        for _ in 0..n {
            self.subscriber
                .on_next(self.next.fetch_add(1, Ordering::Relaxed));
        }
    }

    fn cancel(&self) {}
}

impl Publisher<u64> for CountingSource {
    fn subscribe_with(&self, subscriber: Arc<dyn Subscriber<u64>>, _context: Context) {
        let subscription = Arc::new(CountingSubscription {
            subscriber: subscriber.clone(),
            next: AtomicU64::new(0),
        });
        subscriber.on_subscribe(subscription);
    }
}

/// A subscriber that counts items and requests in batches.
struct Draining {
    received: AtomicU64,
}

impl Draining {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            received: AtomicU64::new(0),
        })
    }
}

impl Subscriber<u64> for Draining {
    fn on_subscribe(&self, _subscription: Arc<dyn Subscription>) {}

    fn on_next(&self, item: u64) {
        self.received.fetch_add(1, Ordering::Relaxed);
        black_box(item);
    }

    fn on_error(&self, _error: manifold_core::ManifoldError) {}

    fn on_complete(&self) {}
}

pub fn bench_multicast(c: &mut Criterion) {
    let mut group = c.benchmark_group("multicast");

    // Fan-out width: dispatch cost per item scales with the live array.
    let subscriber_counts = [1usize, 8, 64, 256];
    let items: u64 = 1_000;

    for &subs in &subscriber_counts {
        group.throughput(Throughput::Elements(items * subs as u64));
        let id = BenchmarkId::from_parameter(format!("dispatch_subs_{subs}"));
        group.bench_with_input(id, &subs, |bencher, &subs| {
            bencher.iter(|| {
                let shared = MulticastPublisher::builder(
                    Arc::new(CountingSource) as Arc<dyn Publisher<u64>>
                )
                .min_subscribers(subs)
                .build();

                let drains: Vec<_> = (0..subs).map(|_| Draining::new()).collect();
                let mut subscriptions = Vec::with_capacity(subs);
                for drain in &drains {
                    let drain = drain.clone();
                    let holder = Arc::new(HoldSubscription::default());
                    shared.subscribe(Arc::new(Forward {
                        drain,
                        holder: holder.clone(),
                    }));
                    subscriptions.push(holder);
                }

                // Every subscriber grants the full budget; the arbiter
                // requests the floor once and the source emits synchronously.
                for holder in &subscriptions {
                    holder.request(items);
                }

                for drain in &drains {
                    black_box(drain.received.load(Ordering::Relaxed));
                }
            });
        });
    }

    // Demand arbitration cost: interleaved small requests across the group.
    for &subs in &[8usize, 64] {
        group.throughput(Throughput::Elements(items));
        let id = BenchmarkId::from_parameter(format!("arbitration_subs_{subs}"));
        group.bench_with_input(id, &subs, |bencher, &subs| {
            bencher.iter(|| {
                let shared = MulticastPublisher::builder(
                    Arc::new(CountingSource) as Arc<dyn Publisher<u64>>
                )
                .min_subscribers(subs)
                .build();

                let mut subscriptions = Vec::with_capacity(subs);
                for _ in 0..subs {
                    let holder = Arc::new(HoldSubscription::default());
                    shared.subscribe(Arc::new(Forward {
                        drain: Draining::new(),
                        holder: holder.clone(),
                    }));
                    subscriptions.push(holder);
                }

                for _ in 0..items / subs as u64 {
                    for holder in &subscriptions {
                        holder.request(1);
                    }
                }
            });
        });
    }

    group.finish();
}

/// Stores the subscription handed out in `on_subscribe` so the bench loop
/// can drive demand from outside the subscriber.
#[derive(Default)]
struct HoldSubscription {
    subscription: parking_lot::Mutex<Option<Arc<dyn Subscription>>>,
}

impl HoldSubscription {
    fn request(&self, n: u64) {
        if let Some(subscription) = self.subscription.lock().clone() {
            subscription.request(n);
        }
    }
}

struct Forward {
    drain: Arc<Draining>,
    holder: Arc<HoldSubscription>,
}

impl Subscriber<u64> for Forward {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        *self.holder.subscription.lock() = Some(subscription);
    }

    fn on_next(&self, item: u64) {
        self.drain.on_next(item);
    }

    fn on_error(&self, error: manifold_core::ManifoldError) {
        self.drain.on_error(error);
    }

    fn on_complete(&self) {
        self.drain.on_complete();
    }
}
