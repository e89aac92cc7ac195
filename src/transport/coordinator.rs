// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! C5: the coordinator. Builds the resolver facade, spawns both pumps, and
//! waits for them to finish.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    cfg::config::Config,
    resolver::HickoryResolverFacade,
    signals,
    transport::{
        downlink::{self, DownlinkConfig},
        session::Signals,
        uplink::{self, UplinkConfig},
    },
};

/// Default per-query timeout when `-x` is not given. The original tool left
/// this to the resolver library's own default; `hickory-resolver`'s is
/// already sane, but pumps need a concrete [`Duration`] to scale by
/// back-off, so a floor is picked here.
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the facade and both pumps from a validated [`Config`] and runs
/// them to completion. Returns once both pumps have exited.
pub async fn run(cfg: Config) -> Result<()> {
    let resolver = Arc::new(
        HickoryResolverFacade::new(cfg.session.clone(), &cfg.resolver)
            .context("failed to construct resolver facade")?,
    );
    let signals = Arc::new(Signals::default());

    signals::spawn_shutdown_listener(signals.shutdown.clone()).context("failed to install signal handlers")?;

    let base_timeout = cfg.resolver.timeout.unwrap_or(DEFAULT_QUERY_TIMEOUT);

    let uplink_cfg = UplinkConfig {
        delay: cfg.delay,
        sleep: cfg.sleep,
        maxbackoff: cfg.maxbackoff,
        faststart: cfg.faststart,
        base_timeout,
    };
    let downlink_cfg = DownlinkConfig {
        sleep: cfg.sleep,
        maxbackoff: cfg.maxbackoff,
        maxpollfail: cfg.maxpollfail,
        base_timeout,
    };

    let downlink_task = tokio::spawn({
        let resolver = resolver.clone();
        let signals = signals.clone();
        async move { downlink::run(resolver, downlink_cfg, signals).await }
    });

    let uplink_task = tokio::spawn({
        let resolver = resolver.clone();
        let signals = signals.clone();
        let bufsz = cfg.session.bufsz;
        async move { uplink::run(resolver, bufsz, uplink_cfg, signals).await }
    });

    let uplink_result = uplink_task.await.context("uplink pump panicked")?;
    signals.shutdown.cancel();
    let downlink_result = downlink_task.await.context("downlink pump panicked")?;

    let downlink_state = downlink_result?;
    info!(
        sum_up = uplink_result.sum_up,
        sum_down = downlink_state.sum,
        "tunnel session ended"
    );

    Ok(())
}
