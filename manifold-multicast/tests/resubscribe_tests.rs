// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Lifecycle tests for epoch reset: full-group cancellation and the
//! terminal resubscribe policy.

use manifold_core::{
    completed, failed, Completable, CompletionCell, ManifoldError, Publisher, TerminalSignal,
};
use manifold_multicast::MulticastPublisher;
use manifold_test_utils::{CompletionProbe, ManualSource, RecordingSubscriber};
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn test_full_cancellation_cancels_upstream_and_resets() {
    let source = ManualSource::<i32>::new();
    let shared = MulticastPublisher::builder(source.clone())
        .min_subscribers(2)
        .build();
    let first = RecordingSubscriber::<i32>::new();
    let second = RecordingSubscriber::<i32>::new();
    shared.subscribe(first.clone());
    shared.subscribe(second.clone());
    first.request(3);
    second.request(3);
    assert_eq!(source.requests(), vec![3]);

    first.cancel();
    assert!(!source.is_cancelled());
    second.cancel();
    assert!(source.is_cancelled());
    assert_eq!(shared.subscriber_count(), 0);

    // A fresh epoch: new subscribers start a second upstream lifecycle with
    // demand accounting back at zero.
    let next = RecordingSubscriber::<i32>::new();
    shared.subscribe(next.clone());
    assert_eq!(source.subscribe_count(), 1);
    let reopened = RecordingSubscriber::<i32>::new();
    shared.subscribe(reopened.clone());
    assert_eq!(source.subscribe_count(), 2);

    next.request(1);
    reopened.request(2);
    assert_eq!(source.subscription_at(1).requests(), vec![1]);
}

#[test]
fn test_cancel_upstream_false_keeps_the_upstream_alive() {
    let source = ManualSource::<i32>::new();
    let shared = MulticastPublisher::builder(source.clone())
        .cancel_upstream(false)
        .build();
    let only = RecordingSubscriber::<i32>::new();
    shared.subscribe(only.clone());
    only.request(1);

    only.cancel();

    assert!(!source.is_cancelled());
    assert_eq!(shared.subscriber_count(), 0);

    // Same epoch, same upstream subscription.
    shared.subscribe(RecordingSubscriber::<i32>::new());
    assert_eq!(source.subscribe_count(), 1);
}

#[test]
fn test_terminal_is_sticky_without_a_resubscribe_policy() -> anyhow::Result<()> {
    let source = ManualSource::<i32>::new();
    let shared = MulticastPublisher::new(source.clone());
    shared.subscribe(RecordingSubscriber::<i32>::new());
    source.complete()?;

    for _ in 0..3 {
        let late = RecordingSubscriber::<i32>::new();
        shared.subscribe(late.clone());
        assert!(late.is_completed());
    }
    assert!(shared.is_terminated());
    assert_eq!(source.subscribe_count(), 1);
    Ok(())
}

#[test]
fn test_immediate_resubscribe_policy_resets_on_terminal() -> anyhow::Result<()> {
    let source = ManualSource::<i32>::new();
    let shared = MulticastPublisher::builder(source.clone())
        .terminal_resubscribe(|_| completed())
        .build();
    shared.subscribe(RecordingSubscriber::<i32>::new());
    source.complete()?;
    assert!(!shared.is_terminated());

    // The next subscriber opens a brand-new upstream lifecycle instead of
    // receiving the old terminal.
    let next = RecordingSubscriber::<i32>::new();
    shared.subscribe(next.clone());
    assert!(!next.is_terminated());
    assert_eq!(source.subscribe_count(), 2);

    next.request(1);
    source.emit(11)?;
    assert_eq!(next.items(), vec![11]);
    Ok(())
}

#[test]
fn test_deferred_resubscribe_waits_for_the_gate() -> anyhow::Result<()> {
    let source = ManualSource::<i32>::new();
    let gate = Arc::new(CompletionCell::new());
    let hook_gate = gate.clone();
    let shared = MulticastPublisher::builder(source.clone())
        .terminal_resubscribe(move |_| hook_gate.clone())
        .build();
    shared.subscribe(RecordingSubscriber::<i32>::new());
    source.complete()?;

    // Until the gate completes, the terminal is replayed.
    let during = RecordingSubscriber::<i32>::new();
    shared.subscribe(during.clone());
    assert!(during.is_completed());
    assert_eq!(source.subscribe_count(), 1);

    gate.complete();

    let after = RecordingSubscriber::<i32>::new();
    shared.subscribe(after.clone());
    assert!(!after.is_terminated());
    assert_eq!(source.subscribe_count(), 2);
    Ok(())
}

#[test]
fn test_resubscribe_gate_outcome_is_observable() -> anyhow::Result<()> {
    let source = ManualSource::<i32>::new();
    let gate = Arc::new(CompletionCell::new());
    let hook_gate = gate.clone();
    let shared = MulticastPublisher::builder(source.clone())
        .terminal_resubscribe(move |_| hook_gate.clone())
        .build();
    // The gate is shared with an external observer, so the reset and the
    // probe see the same completion.
    let probe = CompletionProbe::new();
    gate.subscribe(probe.clone());
    shared.subscribe(RecordingSubscriber::<i32>::new());
    source.complete()?;
    assert!(!probe.is_terminated());
    assert!(shared.is_terminated());

    gate.complete();

    assert!(probe.is_completed());
    assert!(probe.error().is_none());
    assert!(!shared.is_terminated());
    Ok(())
}

#[test]
fn test_failed_resubscribe_gate_stays_terminated() -> anyhow::Result<()> {
    let source = ManualSource::<i32>::new();
    let shared = MulticastPublisher::builder(source.clone())
        .terminal_resubscribe(|_| failed(ManifoldError::stream_error("no reset")))
        .build();
    shared.subscribe(RecordingSubscriber::<i32>::new());
    source.complete()?;

    let late = RecordingSubscriber::<i32>::new();
    shared.subscribe(late.clone());
    assert!(late.is_completed());
    assert!(shared.is_terminated());
    assert_eq!(source.subscribe_count(), 1);
    Ok(())
}

#[test]
fn test_resubscribe_policy_sees_the_terminal_signal() -> anyhow::Result<()> {
    let source = ManualSource::<i32>::new();
    let seen: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();
    let shared = MulticastPublisher::builder(source.clone())
        .terminal_resubscribe(move |signal: &TerminalSignal| {
            recorded.lock().push(signal.is_complete());
            completed()
        })
        .build();
    shared.subscribe(RecordingSubscriber::<i32>::new());

    source.fail(ManifoldError::stream_error("boom"))?;
    assert_eq!(seen.lock().clone(), vec![false]);

    shared.subscribe(RecordingSubscriber::<i32>::new());
    source.complete()?;
    assert_eq!(seen.lock().clone(), vec![false, true]);
    Ok(())
}
