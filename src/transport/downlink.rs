// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! C4: the downlink pump. Polls the resolver facade on a back-off schedule
//! and writes whatever comes back straight to stdout.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{trace, warn};

use crate::{
    resolver::{PollOutcome, ResolverFacade},
    transport::session::{DownlinkState, Signals},
};

#[derive(Debug, Clone)]
pub struct DownlinkConfig {
    /// Minimum gap between polls, scaled by the downlink's own back-off.
    pub sleep: Duration,
    /// Ceiling for the back-off multiplier (tripled per empty/failed poll).
    pub maxbackoff: u32,
    /// Consecutive empty-poll threshold before the pump exits (0 = never).
    pub maxpollfail: u32,
    /// Base per-query timeout.
    pub base_timeout: Duration,
}

fn scaled(base: Duration, factor: u32) -> Duration {
    base.checked_mul(factor).unwrap_or(Duration::MAX)
}

async fn flush<W: AsyncWrite + Unpin>(stdout: &mut W, bytes: &[u8]) -> Result<()> {
    stdout.write_all(bytes).await.context("failed to write tunnel data to stdout")?;
    stdout.flush().await.context("failed to flush stdout")?;
    Ok(())
}

/// Runs the downlink pump against stdout to completion.
pub async fn run<R: ResolverFacade>(resolver: Arc<R>, cfg: DownlinkConfig, signals: Arc<Signals>) -> Result<DownlinkState> {
    run_with(resolver, tokio::io::stdout(), cfg, signals).await
}

/// Runs the downlink pump to completion against any writer: `maxpollfail`
/// consecutive empty polls (when enabled), a fatal write, or shutdown.
///
/// A nudge from the uplink pump races against the sleep: whichever fires
/// first wins, and receiving the nudge resets back-off to 1 immediately
/// rather than waiting out the rest of the current sleep (§4.4). Generic
/// over the writer so tests can inspect what would have reached stdout.
pub async fn run_with<R: ResolverFacade, W: AsyncWrite + Unpin>(
    resolver: Arc<R>,
    mut output: W,
    cfg: DownlinkConfig,
    signals: Arc<Signals>,
) -> Result<DownlinkState> {
    let mut state = DownlinkState::new();

    loop {
        tokio::select! {
            biased;

            () = signals.shutdown.cancelled() => break,

            () = signals.nudge.notified() => {
                state.backoff = 1;
            }

            () = tokio::time::sleep(scaled(cfg.sleep, state.backoff)) => {}
        }

        if signals.shutdown.is_cancelled() {
            break;
        }

        match resolver.poll_downlink(cfg.base_timeout).await {
            Ok(PollOutcome::Bytes(bytes)) => {
                flush(&mut output, &bytes).await?;
                state.sum += bytes.len() as u64;
                state.pollfail = 0;
                state.backoff = 1;
                trace!(sum = state.sum, "downlink data flushed");
            }
            Ok(PollOutcome::Empty) => {
                state.backoff = state.backoff.saturating_mul(3).min(cfg.maxbackoff);
                state.pollfail += 1;
            }
            Err(e) => {
                warn!("downlink poll failed: {e}");
                state.backoff = state.backoff.saturating_mul(3).min(cfg.maxbackoff);
                state.pollfail += 1;
            }
        }

        if cfg.maxpollfail > 0 && state.pollfail > cfg.maxpollfail {
            trace!(pollfail = state.pollfail, "maxpollfail reached, exiting");
            break;
        }
    }

    signals.shutdown.cancel();
    Ok(state)
}
