// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Ready-made [`Completable`] sources.
//!
//! - [`completed()`] terminates every observer immediately with success.
//! - [`failed(e)`] terminates every observer immediately with an error.
//! - [`never()`] never terminates; observers are accepted and dropped.
//! - [`CompletionCell`] is a deferred completable that terminates its
//!   observers when `complete()` or `fail(e)` is called, and replays the
//!   outcome to observers attaching afterwards.

use crate::completable::{Completable, CompletionObserver};
use crate::error::ManifoldError;
use parking_lot::Mutex;
use std::sync::Arc;

struct Completed;

impl Completable for Completed {
    fn subscribe(&self, observer: Arc<dyn CompletionObserver>) {
        observer.on_complete();
    }
}

struct Never;

impl Completable for Never {
    fn subscribe(&self, _observer: Arc<dyn CompletionObserver>) {}
}

struct Failed {
    cause: ManifoldError,
}

impl Completable for Failed {
    fn subscribe(&self, observer: Arc<dyn CompletionObserver>) {
        observer.on_error(self.cause.clone());
    }
}

/// A completable that is already complete.
#[must_use]
pub fn completed() -> Arc<dyn Completable> {
    Arc::new(Completed)
}

/// A completable that never terminates.
#[must_use]
pub fn never() -> Arc<dyn Completable> {
    Arc::new(Never)
}

/// A completable that has already failed with `cause`.
#[must_use]
pub fn failed(cause: ManifoldError) -> Arc<dyn Completable> {
    Arc::new(Failed { cause })
}

struct CellState {
    outcome: Option<Option<ManifoldError>>,
    observers: Vec<Arc<dyn CompletionObserver>>,
}

/// A deferred [`Completable`] that can be terminated after observers attach.
///
/// The first `complete()` or `fail(e)` wins; later calls are ignored.
/// Observers subscribing after termination receive the recorded outcome
/// synchronously.
///
/// # Examples
///
/// ```
/// use manifold_core::{Completable, CompletionCell, CompletionObserver};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// struct Flag(AtomicBool);
/// impl CompletionObserver for Flag {
///     fn on_complete(&self) {
///         self.0.store(true, Ordering::SeqCst);
///     }
///     fn on_error(&self, _e: manifold_core::ManifoldError) {}
/// }
///
/// let cell = CompletionCell::new();
/// let flag = Arc::new(Flag(AtomicBool::new(false)));
/// cell.subscribe(flag.clone());
/// assert!(!flag.0.load(Ordering::SeqCst));
///
/// cell.complete();
/// assert!(flag.0.load(Ordering::SeqCst));
/// ```
pub struct CompletionCell {
    state: Mutex<CellState>,
}

impl CompletionCell {
    /// Creates a new, unterminated cell.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CellState {
                outcome: None,
                observers: Vec::new(),
            }),
        }
    }

    /// Terminate all current and future observers with success.
    pub fn complete(&self) {
        self.terminate(None);
    }

    /// Terminate all current and future observers with `cause`.
    pub fn fail(&self, cause: ManifoldError) {
        self.terminate(Some(cause));
    }

    /// Returns `true` once the cell has terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state.lock().outcome.is_some()
    }

    fn terminate(&self, cause: Option<ManifoldError>) {
        let observers = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return;
            }
            state.outcome = Some(cause.clone());
            std::mem::take(&mut state.observers)
        };
        // Deliver outside the lock; observers may re-enter subscribe.
        for observer in observers {
            deliver(&*observer, cause.as_ref());
        }
    }
}

impl Completable for CompletionCell {
    fn subscribe(&self, observer: Arc<dyn CompletionObserver>) {
        let replay = {
            let mut state = self.state.lock();
            match &state.outcome {
                Some(outcome) => Some(outcome.clone()),
                None => {
                    state.observers.push(observer.clone());
                    None
                }
            }
        };
        if let Some(outcome) = replay {
            deliver(&*observer, outcome.as_ref());
        }
    }
}

impl Default for CompletionCell {
    fn default() -> Self {
        Self::new()
    }
}

fn deliver(observer: &dyn CompletionObserver, cause: Option<&ManifoldError>) {
    match cause {
        None => observer.on_complete(),
        Some(e) => observer.on_error(e.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        completions: AtomicUsize,
        errors: AtomicUsize,
    }

    impl Counting {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                completions: AtomicUsize::new(0),
                errors: AtomicUsize::new(0),
            })
        }
    }

    impl CompletionObserver for Counting {
        fn on_complete(&self) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, _error: ManifoldError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn completed_terminates_synchronously() {
        let observer = Counting::new();
        completed().subscribe(observer.clone());
        assert_eq!(observer.completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn never_accepts_and_ignores_observers() {
        let observer = Counting::new();
        never().subscribe(observer.clone());
        assert_eq!(observer.completions.load(Ordering::SeqCst), 0);
        assert_eq!(observer.errors.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cell_replays_outcome_to_late_observers() {
        let cell = CompletionCell::new();
        cell.fail(ManifoldError::stream_error("late"));

        let observer = Counting::new();
        cell.subscribe(observer.clone());
        assert_eq!(observer.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn first_termination_wins() {
        let cell = CompletionCell::new();
        let observer = Counting::new();
        cell.subscribe(observer.clone());

        cell.complete();
        cell.fail(ManifoldError::stream_error("ignored"));

        assert_eq!(observer.completions.load(Ordering::SeqCst), 1);
        assert_eq!(observer.errors.load(Ordering::SeqCst), 0);
        assert!(cell.is_terminated());
    }
}
