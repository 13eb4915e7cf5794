// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Error types for the Manifold reactive streaming library.
//!
//! This module defines the root [`ManifoldError`] type with specific variants
//! for the failure modes of the demand protocol, plus an aggregation variant
//! used when several downstream callbacks fail during one fan-out pass.
//!
//! # Examples
//!
//! ```
//! use manifold_core::{ManifoldError, Result};
//!
//! fn validate(n: u64) -> Result<()> {
//!     if n == 0 {
//!         return Err(ManifoldError::invalid_demand(n));
//!     }
//!     Ok(())
//! }
//! ```

/// Root error type for all Manifold operations.
///
/// This enum encompasses all error conditions surfaced to subscribers through
/// their `on_error` channel. Protocol violations (duplicate terminal signals,
/// `on_next` after a terminal) are not representable here on purpose: they are
/// fatal programming errors and panic instead.
#[derive(Debug, thiserror::Error)]
pub enum ManifoldError {
    /// Stream processing encountered an error.
    ///
    /// This is a general error for source failures that don't fit other
    /// specific categories.
    #[error("Stream processing error: {context}")]
    StreamProcessingError {
        /// Description of what went wrong during stream processing
        context: String,
    },

    /// Custom error from user code.
    ///
    /// This wraps errors produced by user-provided sources and callbacks,
    /// allowing them to be propagated through the Manifold error system.
    #[error("User error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A subscriber called `request` with an invalid amount.
    ///
    /// Per the demand protocol, `request(n)` requires `n > 0`. The error is
    /// delivered to the offending subscriber only; other subscribers sharing
    /// the same source are unaffected.
    #[error("Invalid demand: request({requested}) requires a positive amount")]
    InvalidDemand {
        /// The invalid amount that was requested
        requested: u64,
    },

    /// A subscribe call exceeded a source's fixed subscriber cardinality.
    ///
    /// Delivered as an immediate error signal to just the rejected
    /// subscriber; existing subscribers keep their subscriptions.
    #[error("Rejected subscribe: source accepts at most {limit} subscribers")]
    RejectedSubscribe {
        /// The configured subscriber limit
        limit: usize,
    },

    /// A downstream callback panicked.
    ///
    /// Panics from `on_subscribe`/`on_next`/terminal callbacks are caught at
    /// the dispatch boundary and converted into this variant so one broken
    /// subscriber cannot corrupt shared state or starve its peers.
    #[error("Subscriber callback panicked: {context}")]
    SubscriberPanic {
        /// Best-effort description extracted from the panic payload
        context: String,
    },

    /// Multiple errors occurred.
    ///
    /// When a terminal signal fans out to several subscribers, more than one
    /// callback can fail. This variant aggregates them so no failure is
    /// silently dropped.
    #[error("Multiple errors occurred: {count} errors")]
    MultipleErrors {
        /// Number of errors that occurred
        count: usize,
        /// The individual errors
        errors: Vec<ManifoldError>,
    },
}

impl ManifoldError {
    /// Create a stream processing error with the given context.
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessingError {
            context: context.into(),
        }
    }

    /// Wrap a user error.
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Create an invalid-demand error for the given requested amount.
    #[must_use]
    pub const fn invalid_demand(requested: u64) -> Self {
        Self::InvalidDemand { requested }
    }

    /// Create a rejected-subscribe error for the given subscriber limit.
    #[must_use]
    pub const fn rejected_subscribe(limit: usize) -> Self {
        Self::RejectedSubscribe { limit }
    }

    /// Convert a caught panic payload into a `SubscriberPanic` error.
    ///
    /// Extracts the panic message when the payload is a `&str` or `String`;
    /// otherwise records an opaque marker.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let context = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::SubscriberPanic { context }
    }

    /// Combine the errors collected during one fan-out pass into a single
    /// error, mirroring suppressed-exception aggregation.
    ///
    /// Returns `None` for an empty list and the error itself for a singleton,
    /// so aggregation never adds a wrapper when there is nothing to combine.
    ///
    /// # Examples
    ///
    /// ```
    /// use manifold_core::ManifoldError;
    ///
    /// assert!(ManifoldError::aggregate(vec![]).is_none());
    ///
    /// let combined = ManifoldError::aggregate(vec![
    ///     ManifoldError::stream_error("first"),
    ///     ManifoldError::stream_error("second"),
    /// ])
    /// .unwrap();
    /// assert!(matches!(
    ///     combined,
    ///     ManifoldError::MultipleErrors { count: 2, .. }
    /// ));
    /// ```
    pub fn aggregate(mut errors: Vec<ManifoldError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            count => Some(Self::MultipleErrors { count, errors }),
        }
    }
}

/// Specialized `Result` type for Manifold operations.
pub type Result<T> = std::result::Result<T, ManifoldError>;

impl Clone for ManifoldError {
    fn clone(&self) -> Self {
        match self {
            Self::StreamProcessingError { context } => Self::StreamProcessingError {
                context: context.clone(),
            },
            // The boxed error cannot be cloned, so degrade to its rendering
            Self::UserError(e) => Self::StreamProcessingError {
                context: format!("User error: {e}"),
            },
            Self::InvalidDemand { requested } => Self::InvalidDemand {
                requested: *requested,
            },
            Self::RejectedSubscribe { limit } => Self::RejectedSubscribe { limit: *limit },
            Self::SubscriberPanic { context } => Self::SubscriberPanic {
                context: context.clone(),
            },
            Self::MultipleErrors { count, errors } => Self::MultipleErrors {
                count: *count,
                errors: errors.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_of_one_is_the_error_itself() {
        let combined =
            ManifoldError::aggregate(vec![ManifoldError::invalid_demand(0)]).unwrap();
        assert!(matches!(
            combined,
            ManifoldError::InvalidDemand { requested: 0 }
        ));
    }

    #[test]
    fn clone_degrades_user_error_to_context() {
        #[derive(Debug, thiserror::Error)]
        #[error("boom")]
        struct Boom;

        let cloned = ManifoldError::user_error(Boom).clone();
        assert!(matches!(
            cloned,
            ManifoldError::StreamProcessingError { context } if context.contains("boom")
        ));
    }

    #[test]
    fn from_panic_extracts_string_payloads() {
        let err = ManifoldError::from_panic(Box::new("it broke".to_string()));
        assert!(matches!(
            err,
            ManifoldError::SubscriberPanic { context } if context == "it broke"
        ));
    }
}
