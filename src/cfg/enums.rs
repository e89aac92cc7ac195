// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use core::fmt;

use clap::ValueEnum;

/// DNS record type requested by downlink poll queries.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[clap(rename_all = "UPPER")]
pub enum RecordType {
    Txt,
    Cname,
    Null,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordType::Txt => "TXT",
            RecordType::Cname => "CNAME",
            RecordType::Null => "NULL",
        })
    }
}

/// Transport used for resolver queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TcpMode {
    /// Plain UDP, one datagram per query.
    #[default]
    Off,
    /// Open a fresh TCP connection for every query.
    NewConnection,
    /// Reuse a single pipelined TCP connection.
    Pipelined,
}

impl TryFrom<u8> for TcpMode {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TcpMode::Off),
            1 => Ok(TcpMode::NewConnection),
            2 => Ok(TcpMode::Pipelined),
            other => {
                Err(anyhow::anyhow!("invalid TCP mode {other} (expected 0, 1 or 2)"))
            },
        }
    }
}

/// How the resolver facade spreads queries across configured name servers.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[clap(rename_all = "lower")]
pub enum ResolverStrategy {
    /// Round-robin through configured servers, one query at a time.
    #[default]
    Rotate,
    /// Query every configured server concurrently, take the first answer.
    Blast,
}

impl fmt::Display for ResolverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolverStrategy::Rotate => "rotate",
            ResolverStrategy::Blast => "blast",
        })
    }
}
