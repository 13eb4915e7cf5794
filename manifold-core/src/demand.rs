// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Flow-control arithmetic for the demand protocol.
//!
//! Demand is an unsigned cumulative counter. Accumulation saturates at
//! [`MAX_DEMAND`], the "effectively unbounded" sentinel, instead of wrapping:
//! a subscriber that has requested `MAX_DEMAND` items has opted out of
//! backpressure and stays there.

/// Sentinel meaning "effectively unbounded demand".
pub const MAX_DEMAND: u64 = u64::MAX;

/// Returns `true` if `n` is a valid `request` amount.
///
/// The demand protocol requires strictly positive requests; zero is routed to
/// the requesting subscriber's error channel by the operator handling it.
#[must_use]
pub const fn is_demand_valid(n: u64) -> bool {
    n != 0
}

/// Accumulate `n` onto `current`, saturating at [`MAX_DEMAND`].
#[must_use]
pub const fn add_demand(current: u64, n: u64) -> u64 {
    current.saturating_add(n)
}
