// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{sync::Arc, time::Duration};

use dnstun_client::transport::{
    downlink::{self, DownlinkConfig},
    session::Signals,
    uplink::{self, UplinkConfig},
};

use crate::integration_tests::fake_resolver::FakeResolver;

#[tokio::test(start_paused = true)]
async fn stdin_eof_cascades_shutdown_to_the_downlink_pump() {
    let resolver = Arc::new(FakeResolver::new());
    let signals = Arc::new(Signals::default());

    let uplink_cfg = UplinkConfig {
        delay: Duration::from_millis(50),
        sleep: Duration::from_millis(5),
        maxbackoff: 4,
        faststart: 0,
        base_timeout: Duration::from_secs(1),
    };
    let downlink_cfg = DownlinkConfig {
        sleep: Duration::from_millis(5),
        maxbackoff: 4,
        maxpollfail: 0,
        base_timeout: Duration::from_secs(1),
    };

    let output = tokio_test::io::Builder::new().build();
    let down_handle = tokio::spawn(downlink::run_with(resolver.clone(), output, downlink_cfg, signals.clone()));

    let up_state = uplink::run_with(resolver.clone(), tokio::io::empty(), 64, uplink_cfg, signals.clone()).await;
    assert_eq!(up_state.sum_up, 0);
    assert!(signals.shutdown.is_cancelled(), "uplink EOF must cancel the shared shutdown token");

    let down_state = down_handle.await.expect("downlink task panicked").expect("downlink returned an error");
    assert_eq!(down_state.sum, 0);
}
