// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt};

/// Verbosity-to-level mapping for the repeatable `-v` flag. `RUST_LOG`, when
/// set, always wins.
fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global `tracing` subscriber.
///
/// Logs always go to stderr: stdout is reserved for bytes coming out of the
/// tunnel (§6), so nothing else may write there.
pub fn init_logger(verbose: u8) -> Result<WorkerGuard> {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_for_verbosity(verbose)))
        .context("failed to build log level filter")?;

    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(verbose >= 2)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}
