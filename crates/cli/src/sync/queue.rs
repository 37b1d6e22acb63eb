// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline queue for persisting operations when disconnected.
//!
//! The whole queue is stored as one JSON array under [`QUEUE_KEY`] and
//! rewritten after every mutation. Writes happen while the queue lock is
//! held, so an older snapshot can never land after a newer one.
//!
//! Storage is best effort: if the durable store fails, the failure is logged
//! and the in-memory queue stays authoritative for the rest of the session.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use tether_core::{get_json, set_json, DurableStore, NewOperation, QueuedOperation, SharedClock};

/// Durable key holding the pending operations.
pub const QUEUE_KEY: &str = "queue:pending";

/// FIFO of operations that have not been delivered yet.
pub struct OfflineQueue {
    store: Arc<dyn DurableStore>,
    clock: SharedClock,
    ops: Mutex<VecDeque<QueuedOperation>>,
}

impl OfflineQueue {
    /// Open the queue, restoring whatever was persisted by a previous run.
    ///
    /// An unreadable or corrupt persisted queue is logged and treated as
    /// empty.
    pub async fn open(store: Arc<dyn DurableStore>, clock: SharedClock) -> Self {
        let ops = match get_json::<Vec<QueuedOperation>>(store.as_ref(), QUEUE_KEY).await {
            Ok(Some(ops)) => {
                tracing::debug!(count = ops.len(), "restored offline queue");
                VecDeque::from(ops)
            }
            Ok(None) => VecDeque::new(),
            Err(e) => {
                tracing::warn!("failed to restore offline queue, starting empty: {}", e);
                VecDeque::new()
            }
        };

        OfflineQueue { store, clock, ops: Mutex::new(ops) }
    }

    /// Enqueue a new operation for later sending. Returns its ID.
    pub async fn enqueue(&self, op: NewOperation) -> String {
        let op = self.prepare(op);
        self.enqueue_operation(op).await
    }

    /// Stamp a new operation with its creation time and ID without queueing
    /// it, for callers that try a direct send first.
    pub fn prepare(&self, op: NewOperation) -> QueuedOperation {
        QueuedOperation::new(op, self.now())
    }

    /// Enqueue an already-built operation (one whose send just failed).
    ///
    /// Enqueueing an ID that is already pending is a no-op.
    pub async fn enqueue_operation(&self, op: QueuedOperation) -> String {
        let id = op.id.clone();
        let mut ops = self.ops.lock().await;
        if ops.iter().any(|queued| queued.id == id) {
            return id;
        }

        ops.push_back(op);
        tracing::debug!(id = %id, pending = ops.len(), "queued operation");
        self.persist(&ops).await;
        id
    }

    /// Read all queued operations, oldest first, without removing them.
    pub async fn snapshot(&self) -> Vec<QueuedOperation> {
        self.ops.lock().await.iter().cloned().collect()
    }

    /// Look up a single pending operation.
    pub async fn get(&self, id: &str) -> Option<QueuedOperation> {
        self.ops.lock().await.iter().find(|op| op.id == id).cloned()
    }

    /// Remove an operation. Returns false if it wasn't queued.
    pub async fn remove(&self, id: &str) -> bool {
        let mut ops = self.ops.lock().await;
        let Some(index) = ops.iter().position(|op| op.id == id) else {
            return false;
        };

        ops.remove(index);
        self.persist(&ops).await;
        true
    }

    /// Record a failed delivery attempt.
    ///
    /// Returns the new retry count, or `None` if the operation is gone.
    pub async fn increment_retry(&self, id: &str) -> Option<u32> {
        let mut ops = self.ops.lock().await;
        let op = ops.iter_mut().find(|op| op.id == id)?;
        op.retry_count = op.retry_count.saturating_add(1);
        let count = op.retry_count;

        self.persist(&ops).await;
        Some(count)
    }

    /// Number of pending operations.
    pub async fn len(&self) -> usize {
        self.ops.lock().await.len()
    }

    /// Check if the queue is empty.
    pub async fn is_empty(&self) -> bool {
        self.ops.lock().await.is_empty()
    }

    /// Drop every pending operation, returning what was discarded.
    pub async fn clear(&self) -> Vec<QueuedOperation> {
        let mut ops = self.ops.lock().await;
        let discarded: Vec<_> = ops.drain(..).collect();
        if let Err(e) = self.store.remove(QUEUE_KEY).await {
            tracing::warn!("failed to clear persisted offline queue: {}", e);
        }
        discarded
    }

    fn now(&self) -> DateTime<Utc> {
        let ms = i64::try_from(self.clock.now_ms()).unwrap_or(i64::MAX);
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
    }

    async fn persist(&self, ops: &VecDeque<QueuedOperation>) {
        let snapshot: Vec<&QueuedOperation> = ops.iter().collect();
        if let Err(e) = set_json(self.store.as_ref(), QUEUE_KEY, &snapshot).await {
            tracing::warn!(pending = ops.len(), "failed to persist offline queue: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
