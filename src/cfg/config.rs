// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use anyhow::{Result, ensure};

use crate::cfg::enums::{RecordType, ResolverStrategy, TcpMode};

/// Maximum length of a compressed DNS name (RFC 1035 4.1.4).
pub const NS_MAXCDNAME: usize = 255;

/// The frozen, per-process identity of a tunnel session.
///
/// Every field here is set once during startup option parsing and never
/// written again; both pumps read their own clone without synchronization
/// (session descriptor invariant 3).
#[derive(Debug, Clone)]
pub struct SessionId {
    /// Random identifier, fixed for the lifetime of the process.
    pub id: u16,
    /// Bitfield reserved for future framing flags (currently always zero).
    pub opt: u16,
    /// Forwarded-session tag, lets several client processes share one resolver.
    pub fwd: u8,
    /// Delegated domain suffix under which all queries are constructed.
    pub dname: String,
    /// Record type requested by downlink poll queries.
    pub record_type: RecordType,
    /// Target uplink chunk size, in bytes.
    pub bufsz: usize,
}

/// Resolver-facing knobs, passed straight through to the resolver facade.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Resolver retry count; `None` keeps the resolver's own default.
    pub retry: Option<usize>,
    /// Per-query timeout; `None` keeps the resolver's own default.
    pub timeout: Option<Duration>,
    /// Transport used for queries.
    pub tcp_mode: TcpMode,
    /// How queries are spread across configured name servers.
    pub strategy: ResolverStrategy,
    /// Name server literal or keyword; `None` uses the system default.
    pub nameserver: Option<String>,
    /// Enable resolver-library debug logging.
    pub debug: bool,
}

/// The complete, validated startup configuration for one run of the client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frozen session identity shared, by clone, with both pumps.
    pub session: SessionId,
    /// Uplink flush deadline.
    pub delay: Duration,
    /// Minimum gap between downlink polls.
    pub sleep: Duration,
    /// Fast-start counter: small reads bypass `delay` until this reaches zero.
    pub faststart: i64,
    /// Ceiling for the downlink back-off multiplier.
    pub maxbackoff: u32,
    /// Consecutive empty-poll threshold before downlink exits (0 = never).
    pub maxpollfail: u32,
    /// Diagnostic verbosity level (number of `-v` flags).
    pub verbose: u8,
    /// Resolver facade configuration.
    pub resolver: ResolverOptions,
}

impl Config {
    /// Validates the cross-field invariants that the CLI parser alone cannot
    /// express (session descriptor invariants 1-3, plus basic sanity).
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.session.dname.len() <= NS_MAXCDNAME - 1,
            "domain name must be at most {} bytes",
            NS_MAXCDNAME - 1
        );
        ensure!(!self.session.dname.is_empty(), "domain name must not be empty");
        ensure!(self.session.bufsz > 0, "bufsz must be > 0");
        ensure!(self.maxbackoff >= 1, "maxbackoff must be >= 1");
        if let Some(retry) = self.resolver.retry {
            ensure!(retry > 0, "retry count must be > 0 when set");
        }
        Ok(())
    }
}
