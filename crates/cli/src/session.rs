// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session wiring of the resilience layer.
//!
//! A [`Session`] owns the queue, sync engine, cache and rate limiter for one
//! signed-in user. It is created at sign-in and torn down at logout; nothing
//! here is process-global.
//!
//! ```text
//! submit(action, op)
//!   │
//!   ├─ rate limiter denies ──────────────► Submitted::RateLimited
//!   ├─ offline ──────────────────────────► queue ─► Submitted::Queued
//!   └─ send
//!        ├─ ok ──────────────────────────► Submitted::Sent
//!        ├─ rejected ────────────────────► Error::Rejected
//!        └─ transient failure ───────────► queue ─► Submitted::Queued
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use tether_core::{DurableStore, NewOperation, QueuedOperation, SharedClock};

use crate::cache::HybridCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::limiter::{RateDecision, RateLimiter};
use crate::sync::{Connectivity, OfflineQueue, SyncEngine, SyncEvent, SyncReport, SyncWorker, Transport};

/// External collaborators a session runs against.
pub struct SessionDeps {
    pub store: Arc<dyn DurableStore>,
    pub transport: Arc<dyn Transport>,
    pub connectivity: Arc<dyn Connectivity>,
    pub clock: SharedClock,
}

/// Outcome of [`Session::submit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Submitted {
    /// Delivered to the backend.
    Sent { id: String },
    /// Stored for delivery once the backend is reachable.
    Queued { id: String },
    /// Refused locally; nothing was sent or queued.
    RateLimited(RateDecision),
}

pub struct Session {
    queue: Arc<OfflineQueue>,
    engine: Arc<SyncEngine>,
    cache: HybridCache,
    limiter: RateLimiter,
    transport: Arc<dyn Transport>,
    connectivity: Arc<dyn Connectivity>,
    worker: Option<SyncWorker>,
}

impl Session {
    /// Build every component over `deps`, restoring persisted state. The
    /// background worker is not started; see [`Session::start`].
    pub async fn open(deps: SessionDeps, config: &Config) -> Self {
        let SessionDeps { store, transport, connectivity, clock } = deps;

        let queue = Arc::new(OfflineQueue::open(Arc::clone(&store), Arc::clone(&clock)).await);
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&queue),
            Arc::clone(&transport),
            connectivity.as_ref(),
            config.queue.clone(),
        ));
        let cache = HybridCache::new(Arc::clone(&store), Arc::clone(&clock), config.cache.clone());
        let limiter = RateLimiter::new(store, clock, config.rate_limits.clone());

        Session { queue, engine, cache, limiter, transport, connectivity, worker: None }
    }

    /// Open a session and start its background sync worker.
    pub async fn start(deps: SessionDeps, config: &Config) -> Self {
        let mut session = Session::open(deps, config).await;
        session.start_worker();
        session
    }

    /// Start the background sync worker if it isn't running.
    pub fn start_worker(&mut self) {
        if self.worker.is_none() {
            tracing::info!("starting sync worker");
            self.worker = Some(Arc::clone(&self.engine).spawn());
        }
    }

    pub fn is_worker_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn cache(&self) -> &HybridCache {
        &self.cache
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub async fn pending_count(&self) -> usize {
        self.queue.len().await
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.engine.subscribe_events()
    }

    /// Drain the queue now if online.
    pub async fn trigger_sync(&self) -> SyncReport {
        self.engine.trigger_sync().await
    }

    /// Ask the background worker to drain. No-op without a worker.
    pub fn request_sync(&self) {
        if let Some(worker) = &self.worker {
            worker.request_sync();
        }
    }

    /// Gate, send, and fall back to the queue on a transient failure.
    ///
    /// The rate limit is charged before anything is sent. A permanent
    /// rejection is returned as [`Error::Rejected`] and nothing is queued.
    pub async fn submit(&self, action: &str, op: NewOperation) -> Result<Submitted> {
        let decision = self.limiter.try_acquire(action).await;
        if !decision.allowed {
            tracing::debug!(action, "submission rate limited");
            return Ok(Submitted::RateLimited(decision));
        }

        let op = self.queue.prepare(op);
        if !self.is_online() {
            return Ok(Submitted::Queued { id: self.queue_for_later(op).await });
        }

        match self.transport.send(&op).await {
            Ok(()) => {
                tracing::debug!(id = %op.id, "operation sent");
                Ok(Submitted::Sent { id: op.id })
            }
            Err(e) if e.is_permanent() => {
                tracing::warn!(id = %op.id, "operation rejected: {}", e);
                Err(Error::Rejected { id: op.id, reason: e.to_string() })
            }
            Err(e) => {
                tracing::info!(id = %op.id, "send failed, queueing for later: {}", e);
                Ok(Submitted::Queued { id: self.queue_for_later(op).await })
            }
        }
    }

    /// Stop the background worker, waiting for an in-progress drain.
    pub async fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown().await;
            tracing::info!("sync worker stopped");
        }
    }

    /// Tear the session down for sign-out.
    ///
    /// Stops the worker, clears every cache namespace and discards pending
    /// operations. The discarded operations are returned so the caller can
    /// tell the user what was lost. Rate-limit windows are kept so a
    /// sign-out can't be used to skip a cooldown.
    pub async fn logout(mut self) -> Vec<QueuedOperation> {
        self.shutdown().await;
        self.cache.clear_all().await;
        let discarded = self.queue.clear().await;
        if discarded.is_empty() {
            tracing::info!("session closed");
        } else {
            tracing::warn!(discarded = discarded.len(), "session closed with undelivered operations");
        }
        discarded
    }

    async fn queue_for_later(&self, op: QueuedOperation) -> String {
        let id = self.queue.enqueue_operation(op).await;
        self.request_sync();
        id
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
