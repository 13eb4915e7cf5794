// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Multicast fan-out operator for the Manifold reactive streams library.
//!
//! [`MulticastPublisher`] shares one upstream subscription among many
//! downstream subscribers:
//!
//! - the upstream is subscribed once per epoch, after a configurable number
//!   of subscribers have attached;
//! - each item is cloned to every live subscriber, and upstream demand is
//!   bounded by the slowest subscriber's cumulative requests;
//! - one misbehaving subscriber (invalid demand, panicking callbacks) is
//!   errored and detached without disturbing its peers;
//! - the upstream terminal signal is replayed to late subscribers, and an
//!   optional resubscribe policy resets the operator for a new upstream
//!   lifecycle.
//!
//! Internally, item dispatch reads a lock-free copy-on-write subscriber
//! snapshot, while subscribe/request/cancel mutations are serialized through
//! an event queue drained by a single winning thread. See the module docs of
//! the private internals for details.
//!
//! # Feature flags
//!
//! - `tracing`: route internal warnings and errors through the `tracing`
//!   crate instead of stderr.

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

#[macro_use]
mod logging;

mod config;
mod demand_queue;
mod event_lock;
mod fan_out;
mod leaf;
mod multicast;
mod terminal_sentinel;

pub use self::config::{MulticastBuilder, ResubscribeHook};
pub use self::multicast::MulticastPublisher;
