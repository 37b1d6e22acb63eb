// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

use std::sync::Arc;

use tether_core::{ManualClock, MemoryStore, NewOperation, SharedClock};

use super::queue::OfflineQueue;

/// Start time used by the manual clocks in sync tests (2026-01-01T00:00:00Z).
pub const T0_MS: u64 = 1_767_225_600_000;

/// Create a chat message for the given session.
pub fn make_test_op(content: &str) -> NewOperation {
    NewOperation::chat_message("session-1", content)
}

/// A fresh queue over the given store with a manual clock at [`T0_MS`].
pub async fn make_queue(store: &MemoryStore) -> (Arc<OfflineQueue>, ManualClock) {
    let clock = ManualClock::new(T0_MS);
    let shared: SharedClock = Arc::new(clock.clone());
    let queue = OfflineQueue::open(Arc::new(store.clone()), shared).await;
    (Arc::new(queue), clock)
}

/// Poll until the queue is empty, giving up after about a second.
pub async fn wait_until_empty(queue: &OfflineQueue) -> bool {
    for _ in 0..100 {
        if queue.is_empty().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}
