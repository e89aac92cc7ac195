// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The resolver facade (§4.2): the only thing the two pumps know about DNS.
//!
//! Both pumps are generic over [`ResolverFacade`] rather than holding a
//! `dyn` trait object, since async trait methods returning `impl Future`
//! aren't dyn-compatible; production code is wired to [`HickoryResolverFacade`]
//! and tests can supply any other implementation.

use std::{future::Future, net::IpAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use hickory_resolver::{
    Resolver, TokioResolver,
    config::{NameServerConfigGroup, ResolveHosts, ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
};
use tracing::{debug, warn};

use crate::{
    cfg::{
        config::{ResolverOptions, SessionId},
        enums::{ResolverStrategy, TcpMode},
    },
    codec,
    transport::error::TransportError,
};

/// What came back from a downlink poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The server had data queued for this session.
    Bytes(Vec<u8>),
    /// The round trip succeeded but nothing was queued.
    Empty,
}

/// The facade the pumps drive. Neither method distinguishes transport
/// failure modes (NXDOMAIN, SERVFAIL, timeout): they all collapse to
/// [`TransportError`] and mean the same thing to the caller, "back off and
/// retry" (§4.2).
pub trait ResolverFacade: Send + Sync {
    /// Sends one uplink chunk as a query. The query's answer is discarded;
    /// only whether the resolver managed to complete the round trip matters.
    fn send_uplink(
        &self,
        payload: &[u8],
        timeout: Duration,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Polls the server for any data queued for this session.
    fn poll_downlink(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<PollOutcome, TransportError>> + Send;
}

/// [`ResolverFacade`] backed by `hickory-resolver`.
pub struct HickoryResolverFacade {
    resolver: TokioResolver,
    session: SessionId,
}

impl HickoryResolverFacade {
    /// Builds the resolver from validated [`ResolverOptions`]. A literal
    /// name server (or one of the recognized keywords) bypasses the system
    /// resolver configuration entirely; otherwise the system's
    /// `/etc/resolv.conf` (or platform equivalent) is used.
    pub fn new(session: SessionId, opts: &ResolverOptions) -> Result<Self> {
        let mut resolver_opts = ResolverOpts::default();
        if let Some(retry) = opts.retry {
            resolver_opts.attempts = retry;
        }
        if let Some(timeout) = opts.timeout {
            resolver_opts.timeout = timeout;
        }
        resolver_opts.use_hosts_file = ResolveHosts::Never;
        resolver_opts.num_concurrent_reqs = match opts.strategy {
            ResolverStrategy::Rotate => 1,
            ResolverStrategy::Blast => 0,
        };

        let resolver = match &opts.nameserver {
            Some(spec) => {
                let group = parse_nameserver_group(spec, opts.tcp_mode)?;
                let config = ResolverConfig::from_parts(None, vec![], group);
                Resolver::builder_with_config(config, TokioConnectionProvider::default())
                    .with_options(resolver_opts)
                    .build()
            }
            None => Resolver::builder_tokio()
                .context("failed to read system resolver configuration")?
                .with_options(resolver_opts)
                .build(),
        };

        if opts.debug {
            debug!(dname = %session.dname, "resolver facade constructed with debug logging enabled");
        }

        Ok(Self { resolver, session })
    }
}

/// Translates a `-r` argument into a name server group. Recognizes a handful
/// of well-known keywords as a convenience; anything else is parsed as a
/// literal IP address.
fn parse_nameserver_group(spec: &str, tcp_mode: TcpMode) -> Result<NameServerConfigGroup> {
    let group = match spec.to_ascii_lowercase().as_str() {
        "google" => NameServerConfigGroup::google(),
        "cloudflare" => NameServerConfigGroup::cloudflare(),
        "quad9" => NameServerConfigGroup::quad9(),
        literal => {
            let addr = IpAddr::from_str(literal)
                .with_context(|| format!("{literal} is not a recognized keyword or IP address"))?;
            match tcp_mode {
                TcpMode::Off => NameServerConfigGroup::from_ips_clear(&[addr], 53, true),
                TcpMode::NewConnection | TcpMode::Pipelined => {
                    NameServerConfigGroup::from_ips_tcp(&[addr], 53, true)
                }
            }
        }
    };
    Ok(group)
}

impl ResolverFacade for HickoryResolverFacade {
    async fn send_uplink(&self, payload: &[u8], timeout: Duration) -> Result<(), TransportError> {
        let name = codec::encode_uplink_name(payload, &self.session.dname)
            .map_err(|e| TransportError::Resolver(e.to_string()))?;

        let lookup = self.resolver.lookup(name, codec::proto_record_type(self.session.record_type));
        match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(_answer)) => Ok(()),
            Ok(Err(e)) => Err(TransportError::Resolver(e.to_string())),
            Err(_) => Err(TransportError::Resolver("query timed out".to_string())),
        }
    }

    async fn poll_downlink(&self, timeout: Duration) -> Result<PollOutcome, TransportError> {
        let name = codec::encode_poll_name(self.session.id, self.session.fwd, &self.session.dname)
            .map_err(|e| TransportError::Resolver(e.to_string()))?;
        let record_type = codec::proto_record_type(self.session.record_type);

        let lookup = self.resolver.lookup(name, record_type);
        let answer = match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => return Err(TransportError::Resolver(e.to_string())),
            Err(_) => return Err(TransportError::Resolver("query timed out".to_string())),
        };

        let mut collected = Vec::new();
        for record in answer.record_iter() {
            let Some(rdata) = record.data() else { continue };
            if let Some(bytes) = codec::decode_rdata(rdata) {
                collected.extend(bytes);
            } else {
                warn!(?record_type, "poll answer carried an rdata this facade cannot decode");
            }
        }

        if collected.is_empty() {
            Ok(PollOutcome::Empty)
        } else {
            Ok(PollOutcome::Bytes(collected))
        }
    }
}
