// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Coordination handles shared between the two pumps. Every field is a
/// one-bit, idempotent signal: repeated identical signals coalesce and no
/// ordering between the two kinds is assumed (§5 of the design).
#[derive(Default)]
pub struct Signals {
    /// Uplink -> downlink: "a send just succeeded, reset your back-off".
    pub nudge: Notify,
    /// Either direction: "shut down" (hangup / terminate / peer gone).
    pub shutdown: CancellationToken,
}

/// Mutable counters owned exclusively by the uplink pump (session descriptor
/// invariant 4: `sum_up` and the uplink's own `backoff`/`faststart` have a
/// single writer).
#[derive(Debug)]
pub struct UplinkState {
    pub sum_up: u64,
    pub backoff: u32,
    pub faststart: i64,
}

impl UplinkState {
    pub fn new(faststart: i64) -> Self {
        Self { sum_up: 0, backoff: 1, faststart }
    }
}

/// Mutable counters owned exclusively by the downlink pump.
#[derive(Debug)]
pub struct DownlinkState {
    pub sum: u64,
    pub backoff: u32,
    pub pollfail: u32,
}

impl DownlinkState {
    pub fn new() -> Self {
        Self { sum: 0, backoff: 1, pollfail: 0 }
    }
}

impl Default for DownlinkState {
    fn default() -> Self {
        Self::new()
    }
}
