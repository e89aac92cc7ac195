// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{sync::Arc, time::Duration};

use dnstun_client::{
    resolver::PollOutcome,
    transport::{
        downlink::{self, DownlinkConfig},
        session::Signals,
    },
};

use crate::integration_tests::fake_resolver::FakeResolver;

#[tokio::test(start_paused = true)]
async fn empty_polls_triple_backoff_up_to_the_ceiling_then_data_resets_it() {
    let resolver = Arc::new(FakeResolver::new());
    resolver.queue_poll(Ok(PollOutcome::Empty));
    resolver.queue_poll(Ok(PollOutcome::Empty));
    resolver.queue_poll(Ok(PollOutcome::Bytes(b"hello".to_vec())));

    let signals = Arc::new(Signals::default());
    let shutdown = signals.shutdown.clone();
    let output = tokio_test::io::Builder::new().write(b"hello").build();

    let cfg = DownlinkConfig {
        sleep: Duration::from_millis(10),
        maxbackoff: 5,
        maxpollfail: 0,
        base_timeout: Duration::from_secs(1),
    };

    let handle = tokio::spawn(downlink::run_with(resolver.clone(), output, cfg, signals));

    // 10ms (empty, backoff -> 3) + 30ms (empty, backoff -> 9 clamped to 5)
    // + 50ms (data, backoff -> 1) = 90ms of scheduled ticks; give it margin.
    tokio::time::advance(Duration::from_millis(150)).await;

    shutdown.cancel();
    let state = handle.await.expect("downlink task panicked").expect("downlink returned an error");

    assert_eq!(state.sum, 5);
    assert_eq!(state.pollfail, 0);
    assert_eq!(state.backoff, 1);
}

#[tokio::test(start_paused = true)]
async fn maxpollfail_stops_the_pump_after_enough_consecutive_empty_polls() {
    let resolver = Arc::new(FakeResolver::new());
    for _ in 0..5 {
        resolver.queue_poll(Ok(PollOutcome::Empty));
    }

    let signals = Arc::new(Signals::default());
    let output = tokio_test::io::Builder::new().build();

    let cfg = DownlinkConfig {
        sleep: Duration::from_millis(10),
        maxbackoff: 4,
        maxpollfail: 2,
        base_timeout: Duration::from_secs(1),
    };

    let handle = tokio::spawn(downlink::run_with(resolver.clone(), output, cfg, signals));
    tokio::time::advance(Duration::from_secs(1)).await;

    let state = handle.await.expect("downlink task panicked").expect("downlink returned an error");

    assert_eq!(state.pollfail, 3);
}
