// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{sync::Arc, time::Duration};

use dnstun_client::transport::{
    session::Signals,
    uplink::{self, UplinkConfig},
};
use tokio::io::AsyncWriteExt;

use crate::integration_tests::fake_resolver::FakeResolver;

fn cfg(delay_ms: u64, faststart: i64) -> UplinkConfig {
    UplinkConfig {
        delay: Duration::from_millis(delay_ms),
        sleep: Duration::from_millis(5),
        maxbackoff: 8,
        faststart,
        base_timeout: Duration::from_secs(1),
    }
}

#[tokio::test(start_paused = true)]
async fn faststart_forwards_small_reads_without_waiting_for_the_deadline() {
    let (mut writer, reader) = tokio::io::duplex(64);
    let resolver = Arc::new(FakeResolver::new());
    let signals = Arc::new(Signals::default());

    let handle = tokio::spawn(uplink::run_with(resolver.clone(), reader, 64, cfg(10_000, 2), signals));

    writer.write_all(b"a").await.expect("write");
    tokio::task::yield_now().await;
    writer.write_all(b"b").await.expect("write");
    tokio::task::yield_now().await;
    drop(writer);

    handle.await.expect("uplink task panicked");

    assert_eq!(resolver.sent_payloads(), vec![b"a".to_vec(), b"b".to_vec()]);
}

#[tokio::test(start_paused = true)]
async fn deadline_flushes_buffered_bytes_once_it_elapses() {
    let (mut writer, reader) = tokio::io::duplex(64);
    let resolver = Arc::new(FakeResolver::new());
    let signals = Arc::new(Signals::default());

    let handle = tokio::spawn(uplink::run_with(resolver.clone(), reader, 64, cfg(100, 0), signals));

    writer.write_all(b"hi").await.expect("write");
    tokio::time::advance(Duration::from_millis(150)).await;
    drop(writer);

    handle.await.expect("uplink task panicked");

    assert_eq!(resolver.sent_payloads(), vec![b"hi".to_vec()]);
}

#[tokio::test(start_paused = true)]
async fn a_full_buffer_flushes_without_waiting_for_the_deadline() {
    let (mut writer, reader) = tokio::io::duplex(64);
    let resolver = Arc::new(FakeResolver::new());
    let signals = Arc::new(Signals::default());

    // bufsz = 4, so "abcd" fills the buffer on its own and must flush
    // immediately even though the 10s deadline never elapses.
    let handle = tokio::spawn(uplink::run_with(resolver.clone(), reader, 4, cfg(10_000, 0), signals));

    writer.write_all(b"abcd").await.expect("write");
    tokio::task::yield_now().await;
    writer.write_all(b"ef").await.expect("write");
    tokio::task::yield_now().await;
    drop(writer);

    handle.await.expect("uplink task panicked");

    assert_eq!(resolver.sent_payloads(), vec![b"abcd".to_vec(), b"ef".to_vec()]);
}
