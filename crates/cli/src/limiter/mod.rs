// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-action sliding-window rate limiter with cooldown.
//!
//! Windows are loaded from the durable store the first time an action is
//! used and written back after every change, so limits survive restarts.
//! Store failures only cost persistence; the in-memory window stays
//! authoritative.

mod policy;
mod window;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;

use tether_core::{get_json, set_json, DurableStore, SharedClock};

pub use policy::{default_policies, RateLimitPolicy, FALLBACK_ACTION};
pub use window::{RateDecision, RateLimitStatus, RateLimitWindow};

/// Prefix of the durable key holding each action's window.
pub const KEY_PREFIX: &str = "ratelimit:";

fn window_key(action: &str) -> String {
    format!("{}{}", KEY_PREFIX, action)
}

pub struct RateLimiter {
    store: Arc<dyn DurableStore>,
    clock: SharedClock,
    policies: BTreeMap<String, RateLimitPolicy>,
    /// Loaded windows. Held across the store write so persisted snapshots
    /// land in mutation order.
    windows: Mutex<HashMap<String, RateLimitWindow>>,
}

impl RateLimiter {
    /// Create a limiter. `policies` is layered over [`default_policies`].
    pub fn new(
        store: Arc<dyn DurableStore>,
        clock: SharedClock,
        policies: BTreeMap<String, RateLimitPolicy>,
    ) -> Self {
        let mut merged = default_policies();
        merged.extend(policies);
        RateLimiter { store, clock, policies: merged, windows: Mutex::new(HashMap::new()) }
    }

    /// Policy applied to `action`, falling back to the `api` policy.
    pub fn policy(&self, action: &str) -> RateLimitPolicy {
        self.policies
            .get(action)
            .or_else(|| self.policies.get(FALLBACK_ACTION))
            .copied()
            .unwrap_or_else(|| RateLimitPolicy::new(100, 60, None))
    }

    pub fn policies(&self) -> &BTreeMap<String, RateLimitPolicy> {
        &self.policies
    }

    /// Check whether `action` may proceed now without recording it.
    pub async fn can_make_request(&self, action: &str) -> RateDecision {
        let policy = self.policy(action);
        let now = self.clock.now_ms();
        let mut windows = self.windows.lock().await;
        let window = self.window_mut(&mut windows, action).await;

        let before = window.clone();
        let decision = window.check(&policy, now);
        if *window != before {
            self.persist(window).await;
        }
        decision
    }

    /// Count one request against `action`. Ignored while cooling down.
    pub async fn record_request(&self, action: &str) {
        let policy = self.policy(action);
        let now = self.clock.now_ms();
        let mut windows = self.windows.lock().await;
        let window = self.window_mut(&mut windows, action).await;

        if window.record(&policy, now) {
            self.persist(window).await;
        } else {
            tracing::debug!(action, "request not recorded during cooldown");
        }
    }

    /// Check and, when allowed, record in one step.
    pub async fn try_acquire(&self, action: &str) -> RateDecision {
        let policy = self.policy(action);
        let now = self.clock.now_ms();
        let mut windows = self.windows.lock().await;
        let window = self.window_mut(&mut windows, action).await;

        let before = window.clone();
        let decision = window.check(&policy, now);
        if decision.allowed {
            window.record(&policy, now);
        }
        if *window != before {
            self.persist(window).await;
        }
        decision
    }

    pub async fn get_status(&self, action: &str) -> RateLimitStatus {
        let policy = self.policy(action);
        let now = self.clock.now_ms();
        let mut windows = self.windows.lock().await;
        self.window_mut(&mut windows, action).await.status(&policy, now)
    }

    /// Forget all recorded requests and any cooldown for `action`.
    pub async fn reset(&self, action: &str) {
        let mut windows = self.windows.lock().await;
        windows.insert(action.to_string(), RateLimitWindow::new(action));
        if let Err(e) = self.store.remove(&window_key(action)).await {
            tracing::warn!(action, "failed to remove rate limit window: {}", e);
        }
    }

    /// Reset every action, including persisted windows not loaded yet.
    pub async fn reset_all(&self) {
        let mut windows = self.windows.lock().await;
        windows.clear();

        let keys = match self.store.keys_with_prefix(KEY_PREFIX).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("cannot list rate limit windows: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.multi_remove(&keys).await {
            tracing::warn!("failed to remove rate limit windows: {}", e);
        }
    }

    async fn window_mut<'a>(
        &self,
        windows: &'a mut HashMap<String, RateLimitWindow>,
        action: &str,
    ) -> &'a mut RateLimitWindow {
        if !windows.contains_key(action) {
            let window = self.load(action).await;
            windows.insert(action.to_string(), window);
        }
        windows.entry(action.to_string()).or_insert_with(|| RateLimitWindow::new(action))
    }

    async fn load(&self, action: &str) -> RateLimitWindow {
        let key = window_key(action);
        match get_json::<RateLimitWindow>(self.store.as_ref(), &key).await {
            Ok(Some(window)) if window.action == action => window,
            Ok(Some(_)) | Ok(None) => RateLimitWindow::new(action),
            Err(e) => {
                tracing::warn!(action, "cannot load rate limit window, starting empty: {}", e);
                RateLimitWindow::new(action)
            }
        }
    }

    async fn persist(&self, window: &RateLimitWindow) {
        let key = window_key(&window.action);
        if let Err(e) = set_json(self.store.as_ref(), &key, window).await {
            tracing::warn!(action = %window.action, "failed to persist rate limit window: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
