// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Folds OS signals into the shared shutdown token (§5: hangup, terminate,
//! and interrupt all mean "shut down", same as the original tool's combined
//! `SIGHUP`/`SIGTERM`/`SIGCHLD` handler).

use anyhow::Result;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Spawns a background task that cancels `shutdown` on the first of
/// `SIGHUP`, `SIGTERM`, or `SIGINT`. Idempotent: cancelling an
/// already-cancelled token is a no-op.
pub fn spawn_shutdown_listener(shutdown: CancellationToken) -> Result<()> {
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sighup.recv() => info!("received SIGHUP, shutting down"),
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
            () = shutdown.cancelled() => return,
        }
        shutdown.cancel();
    });

    Ok(())
}
