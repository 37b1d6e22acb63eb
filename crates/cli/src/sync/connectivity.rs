// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitoring.
//!
//! Online/offline state is published through a `tokio::sync::watch`
//! channel. Subscribing hands out a receiver; dropping the receiver is the
//! unsubscribe.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::transport::{TransportError, TransportResult};

/// Shortest interval between background probes.
const MIN_PROBE_INTERVAL: Duration = Duration::from_millis(10);

/// Source of online/offline transitions.
pub trait Connectivity: Send + Sync {
    /// Subscribe to changes. The receiver starts at the current state.
    fn subscribe(&self) -> watch::Receiver<bool>;

    /// Current state.
    fn is_online(&self) -> bool {
        *self.subscribe().borrow()
    }
}

/// Manually driven connectivity state.
///
/// The host platform (or a probe) calls [`ConnectivityHandle::set_online`];
/// clones share the same state.
#[derive(Debug, Clone)]
pub struct ConnectivityHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityHandle {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        ConnectivityHandle { tx: Arc::new(tx) }
    }

    /// Publish a new state. Subscribers are only woken on actual changes.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            tracing::info!(online, "connectivity changed");
        }
    }
}

impl Connectivity for ConnectivityHandle {
    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Periodically probes a health URL and publishes the result.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl HttpProbe {
    /// Create a probe. `interval` is raised to a small non-zero minimum.
    pub fn new(url: impl Into<String>, interval: Duration, timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;
        Ok(HttpProbe { client, url: url.into(), interval: interval.max(MIN_PROBE_INTERVAL) })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Probe once. Any HTTP response counts as online.
    pub async fn probe(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(url = %self.url, "connectivity probe failed: {}", e);
                false
            }
        }
    }

    /// Run the probe loop in the background until the handle is aborted.
    pub fn spawn(self, handle: ConnectivityHandle) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                handle.set_online(self.probe().await);
            }
        })
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
