// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::ManifoldError;
use crate::subscriber::Subscriber;

/// The terminal signal of a source: either successful completion or an error.
///
/// Each subscribe lifecycle ("epoch") ends with exactly one terminal signal.
/// The signal is cloneable so a multicast source can replay it to every
/// attached subscriber and to late subscribers joining after termination.
#[derive(Debug, Clone)]
pub enum TerminalSignal {
    /// The source completed successfully.
    Complete,
    /// The source failed with the given cause.
    Error(ManifoldError),
}

impl TerminalSignal {
    /// Returns `true` if this signal is a successful completion.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, TerminalSignal::Complete)
    }

    /// Returns the error cause, if any.
    #[must_use]
    pub const fn cause(&self) -> Option<&ManifoldError> {
        match self {
            TerminalSignal::Complete => None,
            TerminalSignal::Error(e) => Some(e),
        }
    }

    /// Deliver this signal to a subscriber as its terminal callback.
    pub fn deliver<T>(&self, subscriber: &dyn Subscriber<T>) {
        match self {
            TerminalSignal::Complete => subscriber.on_complete(),
            TerminalSignal::Error(e) => subscriber.on_error(e.clone()),
        }
    }
}

impl From<Option<ManifoldError>> for TerminalSignal {
    fn from(cause: Option<ManifoldError>) -> Self {
        match cause {
            None => TerminalSignal::Complete,
            Some(e) => TerminalSignal::Error(e),
        }
    }
}
