// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use manifold_core::{Subscriber, TerminalSignal};

/// Stand-in for the live subscriber array once an epoch has terminated.
///
/// Installed as the sole entry of the fan-out snapshot when the upstream
/// delivers its terminal signal. Late subscribers receive the recorded signal
/// directly from the sentinel without ever being added to the array.
///
/// A sentinel never forwards further signals. Asking it to is a severe
/// protocol violation by the upstream (an item or a second terminal after
/// termination) and fails loudly rather than being papered over.
pub(crate) struct TerminalSentinel {
    signal: TerminalSignal,
}

impl TerminalSentinel {
    pub(crate) fn new(signal: TerminalSignal) -> Self {
        Self { signal }
    }

    /// Replay the recorded terminal signal to `subscriber`.
    pub(crate) fn replay<T>(&self, subscriber: &dyn Subscriber<T>) {
        self.signal.deliver(subscriber);
    }

    /// Called when an item arrives after termination.
    ///
    /// # Panics
    ///
    /// Always: this is a broken upstream, not a recoverable condition.
    pub(crate) fn deny_on_next(&self) -> ! {
        panic!(
            "protocol violation: on_next after terminal signal (terminated with {})",
            self.describe()
        );
    }

    /// Called when a second terminal signal arrives.
    ///
    /// # Panics
    ///
    /// Always: at most one terminal signal is permitted per epoch.
    pub(crate) fn deny_terminal(&self) -> ! {
        panic!(
            "protocol violation: duplicate terminal signal (already terminated with {})",
            self.describe()
        );
    }

    fn describe(&self) -> String {
        match self.signal.cause() {
            None => "completion".to_string(),
            Some(e) => format!("error: {e}"),
        }
    }
}
