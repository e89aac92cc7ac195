// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! C3: the uplink pump. Reads stdin, coalesces it into chunks, and ships
//! each chunk out as a query through the resolver facade.

use std::{sync::Arc, time::Duration};

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{trace, warn};

use crate::{
    resolver::ResolverFacade,
    transport::session::{Signals, UplinkState},
};

/// Small reads under this length count toward the fast-start budget (§3,
/// `KEYSTROKELEN`): short enough to look like interactive keystrokes rather
/// than a bulk transfer.
const KEYSTROKE_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct UplinkConfig {
    /// Coalescing deadline once fast-start is exhausted.
    pub delay: Duration,
    /// Gap between flushes, scaled by the uplink's own back-off.
    pub sleep: Duration,
    /// Ceiling for the uplink's own back-off multiplier.
    pub maxbackoff: u32,
    /// Fast-start budget; each sub-keystroke-length read spends one unit.
    pub faststart: i64,
    /// Base per-query timeout, scaled by back-off before each retry.
    pub base_timeout: Duration,
}

struct Gathered {
    filled: usize,
    eof: bool,
}

/// Multiplies a duration by `factor`, saturating instead of panicking on
/// overflow (back-off multipliers can in principle reach `u32::MAX`).
fn scaled(base: Duration, factor: u32) -> Duration {
    base.checked_mul(factor).unwrap_or(Duration::MAX)
}

/// Fills `buf` from stdin until one of: the buffer is full, the coalescing
/// deadline elapses with at least one byte buffered, fast-start forwards a
/// single read immediately, EOF, a read error, or shutdown is requested.
///
/// A deadline that elapses with nothing buffered re-arms rather than
/// flushing empty (§4.3's no-empty-flush rule).
async fn gather<S: AsyncRead + Unpin>(stdin: &mut S, buf: &mut [u8], state: &mut UplinkState, cfg: &UplinkConfig, signals: &Signals) -> Gathered {
    let bufsz = buf.len();
    let mut filled = 0usize;
    let mut eof = false;

    let one_shot = state.faststart > 0 || cfg.delay.is_zero();
    let mut deadline = (!one_shot).then(|| Box::pin(tokio::time::sleep(cfg.delay)));

    'gather: loop {
        let timer = async {
            match deadline.as_mut() {
                Some(d) => d.await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;

            () = signals.shutdown.cancelled() => {
                break 'gather;
            }

            () = timer, if deadline.is_some() => {
                if filled > 0 {
                    break 'gather;
                }
                deadline = Some(Box::pin(tokio::time::sleep(cfg.delay)));
            }

            res = stdin.read(&mut buf[filled..bufsz]) => {
                match res {
                    Ok(0) => {
                        eof = true;
                        break 'gather;
                    }
                    Ok(n) => {
                        filled += n;
                        if filled == bufsz || one_shot {
                            break 'gather;
                        }
                    }
                    Err(e) => {
                        warn!("stdin read failed, treating as end of stream: {e}");
                        eof = true;
                        break 'gather;
                    }
                }
            }
        }
    }

    if state.faststart > 0 && filled <= KEYSTROKE_LEN {
        state.faststart -= 1;
    }

    Gathered { filled, eof }
}

/// Sends one chunk, retrying with growing back-off until the facade accepts
/// it. The payload is never dropped (§4.3): the loop blocks here even past
/// a shutdown request, since a half-sent stream is worse than a slow exit.
async fn send_with_retry<R: ResolverFacade>(resolver: &R, payload: &[u8], state: &mut UplinkState, maxbackoff: u32, base_timeout: Duration) {
    loop {
        let timeout = scaled(base_timeout, state.backoff);
        match resolver.send_uplink(payload, timeout).await {
            Ok(()) => return,
            Err(e) => {
                warn!("uplink query failed, retrying: {e}");
                state.backoff = (state.backoff + 1).min(maxbackoff);
            }
        }
    }
}

/// Runs the uplink pump against stdin to completion.
pub async fn run<R: ResolverFacade>(resolver: Arc<R>, bufsz: usize, cfg: UplinkConfig, signals: Arc<Signals>) -> UplinkState {
    run_with(resolver, tokio::io::stdin(), bufsz, cfg, signals).await
}

/// Runs the uplink pump to completion against any reader: input EOF, a
/// fatal read error, or shutdown. Finishing always cancels
/// `signals.shutdown`, since there is no more input left for the downlink
/// side to wait on. Generic over the reader so tests can drive it with an
/// in-memory stream instead of the real stdin.
pub async fn run_with<R: ResolverFacade, S: AsyncRead + Unpin>(
    resolver: Arc<R>,
    mut input: S,
    bufsz: usize,
    cfg: UplinkConfig,
    signals: Arc<Signals>,
) -> UplinkState {
    let mut buf = vec![0u8; bufsz];
    let mut state = UplinkState::new(cfg.faststart);

    loop {
        let gathered = gather(&mut input, &mut buf, &mut state, &cfg, &signals).await;

        if gathered.filled > 0 {
            send_with_retry(resolver.as_ref(), &buf[..gathered.filled], &mut state, cfg.maxbackoff, cfg.base_timeout).await;
            state.sum_up += gathered.filled as u64;
            trace!(sum_up = state.sum_up, "uplink chunk sent");
            signals.nudge.notify_one();
        }

        if gathered.eof || signals.shutdown.is_cancelled() {
            break;
        }

        tokio::select! {
            () = signals.shutdown.cancelled() => break,
            () = tokio::time::sleep(scaled(cfg.sleep, state.backoff)) => {}
        }
    }

    signals.shutdown.cancel();
    state
}
