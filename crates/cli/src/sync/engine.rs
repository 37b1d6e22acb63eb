// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine for delivering the offline queue.
//!
//! Provides:
//! - A single-flight [`SyncEngine::drain`] that walks the queue in FIFO order
//! - Bounded retries, with explicit reporting of dropped operations
//! - A background worker that drains on reconnect, on request, and after an
//!   exponential backoff when transient failures remain

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use tether_core::QueuedOperation;

use super::connectivity::Connectivity;
use super::queue::OfflineQueue;
use super::transport::Transport;

/// Capacity of the sync event channel. Slow subscribers miss old events.
const EVENT_CAPACITY: usize = 64;

/// Configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delivery attempts before an operation is dropped.
    pub max_retries: u32,
    /// Pause between consecutive sends within one drain (milliseconds).
    pub inter_item_delay_ms: u64,
    /// Initial delay before re-draining after transient failures (milliseconds).
    pub retry_initial_delay_ms: u64,
    /// Maximum delay between re-drain attempts (seconds).
    pub retry_max_delay_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            max_retries: 3,
            inter_item_delay_ms: 250,
            retry_initial_delay_ms: 1000,
            retry_max_delay_secs: 30,
        }
    }
}

/// Why a drain didn't run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Another drain was already in flight.
    InFlight,
    /// Connectivity was down.
    Offline,
}

/// Why an operation left the queue without being delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    /// Transient failures exhausted the retry budget.
    MaxRetries { attempts: u32 },
    /// The backend refused the operation.
    Rejected { message: String },
}

/// An operation that was given up on. Surfaced so the user can be told.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedOperation {
    pub operation: QueuedOperation,
    #[serde(flatten)]
    pub reason: DropReason,
}

/// One failed send within a drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub id: String,
    pub error: String,
    /// Retry count after this failure.
    pub retry_count: u32,
    /// Whether the operation was dropped as a result.
    pub permanent: bool,
}

/// Aggregate result of a drain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    /// Operations delivered and removed.
    pub synced: usize,
    /// Operations whose send failed (retained or dropped).
    pub failed: usize,
    pub errors: Vec<SyncFailure>,
    pub dropped: Vec<DroppedOperation>,
    /// Operations still queued after the drain.
    pub remaining: usize,
    /// Set when the drain stopped early because connectivity was lost.
    pub interrupted: bool,
    /// Set when no drain happened.
    pub skipped: Option<SkipReason>,
}

impl SyncReport {
    fn skipped(reason: SkipReason, remaining: usize) -> Self {
        SyncReport { remaining, skipped: Some(reason), ..Default::default() }
    }

    /// Failures that left the operation queued for another attempt.
    pub fn retryable(&self) -> usize {
        self.errors.iter().filter(|e| !e.permanent).count()
    }
}

/// Notifications published by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// An operation was removed without being delivered.
    Dropped(DroppedOperation),
    /// A drain finished.
    Drained { synced: usize, failed: usize, remaining: usize },
}

/// Exponential backoff between re-drains.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial_ms: u64,
    max_ms: u64,
    next_ms: u64,
}

impl Backoff {
    pub fn new(initial_ms: u64, max_ms: u64) -> Self {
        let initial_ms = initial_ms.max(1);
        Backoff { initial_ms, max_ms: max_ms.max(initial_ms), next_ms: initial_ms }
    }

    /// Delay to wait now; doubles the following one up to the maximum.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next_ms;
        self.next_ms = std::cmp::min(self.next_ms.saturating_mul(2), self.max_ms);
        Duration::from_millis(delay)
    }

    pub fn reset(&mut self) {
        self.next_ms = self.initial_ms;
    }
}

/// Drains the offline queue through a transport.
pub struct SyncEngine {
    queue: Arc<OfflineQueue>,
    transport: Arc<dyn Transport>,
    connectivity: watch::Receiver<bool>,
    config: SyncConfig,
    /// Held for the duration of a drain.
    in_flight: Mutex<()>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncEngine {
    pub fn new(
        queue: Arc<OfflineQueue>,
        transport: Arc<dyn Transport>,
        connectivity: &dyn Connectivity,
        config: SyncConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        SyncEngine {
            queue,
            transport,
            connectivity: connectivity.subscribe(),
            config,
            in_flight: Mutex::new(()),
            events,
        }
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_online(&self) -> bool {
        *self.connectivity.borrow()
    }

    /// Number of operations waiting for delivery.
    pub async fn pending_count(&self) -> usize {
        self.queue.len().await
    }

    /// Subscribe to drop and drain notifications.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Drain now if online; otherwise report the drain as skipped.
    pub async fn trigger_sync(&self) -> SyncReport {
        if !self.is_online() {
            return SyncReport::skipped(SkipReason::Offline, self.queue.len().await);
        }
        self.drain().await
    }

    /// Attempt delivery of every queued operation, oldest first.
    ///
    /// Only one drain runs at a time; a concurrent call returns immediately
    /// with [`SkipReason::InFlight`]. Connectivity is checked before each
    /// send and the drain stops, leaving the rest queued, once it drops.
    pub async fn drain(&self) -> SyncReport {
        let Ok(_token) = self.in_flight.try_lock() else {
            tracing::debug!("drain already in flight, skipping");
            return SyncReport::skipped(SkipReason::InFlight, self.queue.len().await);
        };

        let ops = self.queue.snapshot().await;
        if !ops.is_empty() {
            tracing::info!(pending = ops.len(), "draining offline queue");
        }

        let delay = Duration::from_millis(self.config.inter_item_delay_ms);
        let mut report = SyncReport::default();

        for (index, op) in ops.into_iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if !self.is_online() {
                tracing::info!("connectivity lost, stopping drain");
                report.interrupted = true;
                break;
            }

            match self.transport.send(&op).await {
                Ok(()) => {
                    self.queue.remove(&op.id).await;
                    report.synced += 1;
                    tracing::debug!(id = %op.id, "delivered queued operation");
                }
                Err(e) if e.is_permanent() => {
                    tracing::warn!(id = %op.id, "operation rejected, dropping: {}", e);
                    self.queue.remove(&op.id).await;
                    report.failed += 1;
                    report.errors.push(SyncFailure {
                        id: op.id.clone(),
                        error: e.to_string(),
                        retry_count: op.retry_count,
                        permanent: true,
                    });
                    self.record_drop(&mut report, op, DropReason::Rejected { message: e.to_string() });
                }
                Err(e) => {
                    // Gone means someone else settled it (e.g. a clear) mid-drain
                    let Some(attempts) = self.queue.increment_retry(&op.id).await else {
                        continue;
                    };
                    report.failed += 1;

                    let exhausted = attempts >= self.config.max_retries;
                    report.errors.push(SyncFailure {
                        id: op.id.clone(),
                        error: e.to_string(),
                        retry_count: attempts,
                        permanent: exhausted,
                    });

                    if exhausted {
                        tracing::warn!(id = %op.id, attempts, "retries exhausted, dropping: {}", e);
                        self.queue.remove(&op.id).await;
                        let op = QueuedOperation { retry_count: attempts, ..op };
                        self.record_drop(&mut report, op, DropReason::MaxRetries { attempts });
                    } else {
                        tracing::debug!(id = %op.id, attempts, "send failed, will retry: {}", e);
                    }
                }
            }
        }

        report.remaining = self.queue.len().await;
        if report.synced > 0 || report.failed > 0 {
            tracing::info!(
                synced = report.synced,
                failed = report.failed,
                remaining = report.remaining,
                "drain finished"
            );
        }
        let _ = self.events.send(SyncEvent::Drained {
            synced: report.synced,
            failed: report.failed,
            remaining: report.remaining,
        });

        report
    }

    fn record_drop(&self, report: &mut SyncReport, operation: QueuedOperation, reason: DropReason) {
        let dropped = DroppedOperation { operation, reason };
        let _ = self.events.send(SyncEvent::Dropped(dropped.clone()));
        report.dropped.push(dropped);
    }

    /// Start the background worker.
    ///
    /// The worker drains when connectivity comes back, when
    /// [`SyncWorker::request_sync`] is called, and after a backoff delay
    /// while transient failures remain. It also drains once at startup if
    /// already online.
    pub fn spawn(self: Arc<Self>) -> SyncWorker {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_worker(self, trigger_rx, shutdown_rx));

        SyncWorker { trigger: trigger_tx, shutdown: Some(shutdown_tx), handle: Some(handle) }
    }
}

async fn run_worker(
    engine: Arc<SyncEngine>,
    mut trigger: mpsc::Receiver<()>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut connectivity = engine.connectivity.clone();
    let mut connectivity_open = true;
    let mut backoff = Backoff::new(
        engine.config.retry_initial_delay_ms,
        engine.config.retry_max_delay_secs.saturating_mul(1000),
    );
    let mut retry_at: Option<Instant> = None;
    let mut drain_now = *connectivity.borrow_and_update();

    tracing::debug!("sync worker started");

    loop {
        if drain_now {
            drain_now = false;
            let report = engine.drain().await;
            if report.skipped.is_none() && report.retryable() > 0 && engine.is_online() {
                let delay = backoff.next_delay();
                tracing::debug!(delay_ms = delay.as_millis() as u64, "scheduling retry drain");
                retry_at = Some(Instant::now() + delay);
            } else if report.skipped.is_none() {
                backoff.reset();
                retry_at = None;
            }
        }

        tokio::select! {
            _ = &mut shutdown => break,
            changed = wait_for_change(&mut connectivity, connectivity_open) => match changed {
                Ok(()) => {
                    if *connectivity.borrow_and_update() {
                        drain_now = true;
                    }
                }
                Err(_) => connectivity_open = false,
            },
            msg = trigger.recv() => match msg {
                Some(()) => drain_now = true,
                None => break,
            },
            _ = sleep_until_retry(retry_at) => {
                retry_at = None;
                drain_now = true;
            }
        }
    }

    tracing::debug!("sync worker stopped");
}

async fn wait_for_change(
    connectivity: &mut watch::Receiver<bool>,
    open: bool,
) -> Result<(), watch::error::RecvError> {
    if open {
        connectivity.changed().await
    } else {
        std::future::pending().await
    }
}

async fn sleep_until_retry(retry_at: Option<Instant>) {
    match retry_at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Handle to the background sync worker.
pub struct SyncWorker {
    trigger: mpsc::Sender<()>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    /// Ask the worker to drain. Coalesces with a request that is already
    /// pending.
    pub fn request_sync(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Stop the worker, waiting for an in-progress drain to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("sync worker ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
