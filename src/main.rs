// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use clap::Parser;
use dnstun_client::{cfg::{cli::Cli, logger::init_logger}, transport::coordinator};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = cli.into_config()?;

    let _logger_guard = init_logger(cfg.verbose)?;

    info!(
        dname = %cfg.session.dname,
        session_id = cfg.session.id,
        record_type = %cfg.session.record_type,
        "starting tunnel"
    );

    coordinator::run(cfg).await
}
