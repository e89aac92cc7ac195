// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::cfg::{
    config::{Config, ResolverOptions, SessionId},
    enums::{RecordType, ResolverStrategy, TcpMode},
};

/// Tunnel a byte stream over DNS to a cooperating authoritative server.
#[derive(Parser, Debug)]
#[command(name = "dnstun-client", author, version, long_about = None)]
pub struct Cli {
    /// Delegated domain name under which all queries are constructed.
    pub dname: String,

    /// Uplink flush deadline, in microseconds.
    #[arg(short = 'A', long = "delay", default_value_t = 500_000)]
    pub delay_us: u64,

    /// Uplink chunk size, in bytes.
    #[arg(short = 'B', long = "bufsz", default_value_t = 110)]
    pub bufsz: usize,

    /// Maximum polling back-off multiplier.
    #[arg(short = 'b', long = "maxbackoff", default_value_t = 64)]
    pub maxbackoff: u32,

    /// Turn on resolver debug logging.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Fast-start count (0 disables): number of small reads forwarded
    /// immediately before the coalescing deadline engages.
    #[arg(short = 'F', long = "faststart", default_value_t = 3)]
    pub faststart: i64,

    /// Maximum consecutive empty polls before the downlink pump exits (0 =
    /// never).
    #[arg(short = 'M', long = "maxpollfail", default_value_t = 0)]
    pub maxpollfail: u32,

    /// Minimum time to sleep between polling queries, in microseconds.
    #[arg(short = 'm', long = "sleep", default_value_t = 500_000)]
    pub sleep_us: u64,

    /// Resolver retry count.
    #[arg(short = 'R', long = "retry")]
    pub retry: Option<usize>,

    /// Name server: a literal address, or a keyword such as "random".
    #[arg(short = 'r', long = "nameserver")]
    pub nameserver: Option<String>,

    /// Resolver strategy.
    #[arg(short = 'S', long = "strategy", value_enum, default_value_t = ResolverStrategy::Rotate)]
    pub strategy: ResolverStrategy,

    /// Forwarded-session tag (0-255).
    #[arg(short = 's', long = "fwd", default_value_t = 0)]
    pub fwd: u8,

    /// TCP mode: 0 = UDP, 1 = new TCP connection per query, 2 = pipelined
    /// TCP.
    #[arg(short = 'T', long = "tcp", default_value_t = 0)]
    pub tcp_mode: u8,

    /// Poll record type.
    #[arg(short = 't', long = "type", value_enum, default_value_t = RecordType::Txt)]
    pub record_type: RecordType,

    /// Increase verbosity (repeatable).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Resolver per-query timeout, in milliseconds.
    #[arg(short = 'x', long = "timeout")]
    pub timeout_ms: Option<u64>,
}

impl Cli {
    /// Turns parsed command-line arguments into a validated [`Config`].
    pub fn into_config(self) -> Result<Config> {
        let tcp_mode = TcpMode::try_from(self.tcp_mode)?;

        let cfg = Config {
            session: SessionId {
                id: rand::random::<u16>(),
                opt: 0,
                fwd: self.fwd,
                dname: self.dname,
                record_type: self.record_type,
                bufsz: self.bufsz,
            },
            delay: Duration::from_micros(self.delay_us),
            sleep: Duration::from_micros(self.sleep_us),
            faststart: self.faststart,
            maxbackoff: self.maxbackoff,
            maxpollfail: self.maxpollfail,
            verbose: self.verbose,
            resolver: ResolverOptions {
                retry: self.retry,
                timeout: self.timeout_ms.map(Duration::from_millis),
                tcp_mode,
                strategy: self.strategy,
                nameserver: self.nameserver,
                debug: self.debug,
            },
        };

        cfg.validate()?;
        Ok(cfg)
    }
}
