// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use manifold_core::{CompletionObserver, ManifoldError};
use parking_lot::Mutex;
use std::sync::Arc;

/// A [`CompletionObserver`] recording which terminal it received.
pub struct CompletionProbe {
    outcome: Mutex<Option<Option<ManifoldError>>>,
}

impl CompletionProbe {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.outcome.lock().is_some()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(*self.outcome.lock(), Some(None))
    }

    #[must_use]
    pub fn error(&self) -> Option<ManifoldError> {
        self.outcome.lock().clone().flatten()
    }
}

impl CompletionObserver for CompletionProbe {
    fn on_complete(&self) {
        *self.outcome.lock() = Some(None);
    }

    fn on_error(&self, error: ManifoldError) {
        *self.outcome.lock() = Some(Some(error));
    }
}
