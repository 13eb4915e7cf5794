// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Intrusive binary min-heap over per-subscriber demand.
//!
//! The fan-out requests upstream only as much as its slowest subscriber has
//! authorized, so it constantly needs the minimum cumulative demand across
//! all attached subscribers. Entries carry their own heap position
//! (back-pointer index), which makes removal of an arbitrary entry O(log n) —
//! required for cancellation of a non-minimum subscriber, not just min-pop.
//!
//! Demand only ever increases while an entry is attached, so re-heapifying
//! after a change is a single sift-down; no decrease-key is needed.

use std::sync::Arc;

/// Index value meaning "not currently in the queue".
pub(crate) const NOT_IN_QUEUE: usize = usize::MAX;

/// An entry that knows its demand and stores its own heap position.
pub(crate) trait DemandEntry {
    /// Cumulative granted demand; the heap key.
    fn demand(&self) -> u64;

    /// Current heap position, or [`NOT_IN_QUEUE`].
    fn queue_index(&self) -> usize;

    /// Record a new heap position.
    fn set_queue_index(&self, index: usize);
}

/// Array-backed min-heap keyed by [`DemandEntry::demand`].
///
/// Ties are broken by heap mechanics only: deterministic for a given sequence
/// of operations, but no ordering guarantee between equal keys.
pub(crate) struct DemandQueue<E> {
    heap: Vec<Arc<E>>,
}

impl<E: DemandEntry> DemandQueue<E> {
    pub(crate) fn new() -> Self {
        Self { heap: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The entry with the least demand, if any.
    pub(crate) fn peek(&self) -> Option<&Arc<E>> {
        self.heap.first()
    }

    /// The least demand across all entries, if any.
    pub(crate) fn min_demand(&self) -> Option<u64> {
        self.heap.first().map(|e| e.demand())
    }

    /// Insert `entry`. The entry must not already be queued.
    pub(crate) fn add(&mut self, entry: Arc<E>) {
        debug_assert_eq!(
            entry.queue_index(),
            NOT_IN_QUEUE,
            "entry added while already in the demand queue"
        );
        let index = self.heap.len();
        entry.set_queue_index(index);
        self.heap.push(entry);
        self.sift_up(index);
    }

    /// Remove an arbitrary entry via its back-pointer index.
    ///
    /// Returns `false` if the entry is not queued (already detached).
    pub(crate) fn remove(&mut self, entry: &Arc<E>) -> bool {
        let index = entry.queue_index();
        if index == NOT_IN_QUEUE {
            return false;
        }
        debug_assert!(
            index < self.heap.len() && Arc::ptr_eq(&self.heap[index], entry),
            "demand queue back-pointer out of sync"
        );
        entry.set_queue_index(NOT_IN_QUEUE);
        let last = self.heap.pop().filter(|_| index < self.heap.len());
        if let Some(last) = last {
            last.set_queue_index(index);
            self.heap[index] = last;
            self.fix(index);
        }
        true
    }

    /// Restore heap order after `entry`'s demand increased.
    pub(crate) fn priority_changed(&mut self, entry: &Arc<E>) {
        let index = entry.queue_index();
        debug_assert!(
            index != NOT_IN_QUEUE && index < self.heap.len(),
            "priority change for an entry not in the demand queue"
        );
        self.sift_down(index);
    }

    /// Detach every entry and empty the queue.
    pub(crate) fn clear(&mut self) {
        for entry in self.heap.drain(..) {
            entry.set_queue_index(NOT_IN_QUEUE);
        }
    }

    fn fix(&mut self, index: usize) {
        if index > 0 && self.heap[index].demand() < self.heap[(index - 1) / 2].demand() {
            self.sift_up(index);
        } else {
            self.sift_down(index);
        }
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[index].demand() >= self.heap[parent].demand() {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut smallest = left;
            if right < len && self.heap[right].demand() < self.heap[left].demand() {
                smallest = right;
            }
            if self.heap[index].demand() <= self.heap[smallest].demand() {
                break;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.heap[a].set_queue_index(a);
        self.heap[b].set_queue_index(b);
    }
}
