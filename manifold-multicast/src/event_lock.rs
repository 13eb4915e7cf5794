// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Single-permit serialization lock for subscription events.
//!
//! Any thread may post subscribe/request/cancel events at any time, but only
//! one thread at a time may mutate the shared fan-out state. Instead of a
//! blocking mutex, contenders set a `PENDING` bit and return immediately; the
//! current holder observes the bit on release and drains again. Callers that
//! fail to acquire never park: the event they enqueued before attempting
//! acquisition is guaranteed to be seen by the holder.

use std::sync::atomic::{AtomicU8, Ordering};

const UNLOCKED: u8 = 0;
const ACQUIRED: u8 = 1;
const PENDING: u8 = 2;

/// A try-lock whose release reports whether work arrived while it was held.
pub(crate) struct EventLock {
    state: AtomicU8,
}

impl EventLock {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(UNLOCKED),
        }
    }

    /// Attempt to become the exclusive event processor.
    ///
    /// On failure the `PENDING` bit is set so the holder re-drains before
    /// fully releasing; the caller must have enqueued its event beforehand.
    pub(crate) fn try_acquire(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current & ACQUIRED == 0 {
                match self.state.compare_exchange_weak(
                    current,
                    ACQUIRED,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => return true,
                    Err(actual) => current = actual,
                }
            } else {
                if current & PENDING != 0 {
                    return false;
                }
                match self.state.compare_exchange_weak(
                    current,
                    current | PENDING,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => return false,
                    Err(actual) => current = actual,
                }
            }
        }
    }

    /// Release the lock.
    ///
    /// Returns `true` when fully released. Returns `false` when events
    /// arrived while the lock was held: the `PENDING` bit is consumed, the
    /// lock stays held, and the caller must drain again.
    pub(crate) fn release(&self) -> bool {
        match self
            .state
            .compare_exchange(ACQUIRED, UNLOCKED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(_) => {
                // Only the holder clears ACQUIRED, so the failure means
                // PENDING was set. Consume it and keep the lock.
                self.state.store(ACQUIRED, Ordering::Release);
                false
            }
        }
    }
}
