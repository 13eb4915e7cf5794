// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the Manifold reactive streaming library.
//!
//! This crate provides the imperative halves of operator tests, for use in
//! development and testing only:
//!
//! - [`RecordingSubscriber`] — a downstream that records every signal and can
//!   drive its subscription, with optional panic switches for testing panic
//!   isolation;
//! - [`ManualSource`] — an upstream driven by explicit `emit` / `complete` /
//!   `fail` calls that records subscribes, contexts, and demand;
//! - [`RecordingSubscription`] — the demand/cancel recorder a `ManualSource`
//!   hands out;
//! - [`CompletionProbe`] — an observer recording a completable's terminal.
//!
//! A typical operator test subscribes a few recording subscribers, drives a
//! manual source, and asserts on the recorded signal and demand sequences.

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

pub mod completion_probe;
pub mod manual_source;
pub mod recording;

pub use self::completion_probe::CompletionProbe;
pub use self::manual_source::{ManualSource, RecordingSubscription};
pub use self::recording::{RecordingSubscriber, Signal};
