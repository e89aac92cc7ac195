// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A scriptable [`ResolverFacade`] stand-in: records every uplink payload it
//! is handed and replays a canned sequence of poll outcomes, so the pumps'
//! scheduling behavior can be exercised without a real resolver.

use std::{collections::VecDeque, sync::Mutex, time::Duration};

use dnstun_client::{resolver::{PollOutcome, ResolverFacade}, transport::error::TransportError};

struct Inner {
    sent: Vec<Vec<u8>>,
    send_failures_remaining: u32,
    poll_script: VecDeque<Result<PollOutcome, TransportError>>,
}

pub struct FakeResolver {
    inner: Mutex<Inner>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                sent: Vec::new(),
                send_failures_remaining: 0,
                poll_script: VecDeque::new(),
            }),
        }
    }

    /// Makes the next `count` calls to `send_uplink` fail before succeeding.
    pub fn fail_next_sends(&self, count: u32) {
        self.inner.lock().expect("lock poisoned").send_failures_remaining = count;
    }

    /// Queues a poll outcome to be returned by the next call to
    /// `poll_downlink`. Once the queue is drained, polls return `Empty`.
    pub fn queue_poll(&self, outcome: Result<PollOutcome, TransportError>) {
        self.inner.lock().expect("lock poisoned").poll_script.push_back(outcome);
    }

    pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
        self.inner.lock().expect("lock poisoned").sent.clone()
    }
}

impl Default for FakeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverFacade for FakeResolver {
    async fn send_uplink(&self, payload: &[u8], _timeout: Duration) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if inner.send_failures_remaining > 0 {
            inner.send_failures_remaining -= 1;
            return Err(TransportError::Resolver("injected failure".to_string()));
        }
        inner.sent.push(payload.to_vec());
        Ok(())
    }

    async fn poll_downlink(&self, _timeout: Duration) -> Result<PollOutcome, TransportError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        Ok(inner.poll_script.pop_front().transpose()?.unwrap_or(PollOutcome::Empty))
    }
}
