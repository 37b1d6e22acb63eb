// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sliding-window accounting for a single action.
//!
//! All methods take the current time explicitly so the state machine can be
//! driven by any clock.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::policy::RateLimitPolicy;

/// Outcome of a rate-limit check. A denial is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining_requests: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RateDecision {
    fn allow(remaining_requests: u32) -> Self {
        RateDecision { allowed: true, remaining_requests, retry_after_ms: None, message: None }
    }

    fn deny(action: &str, retry_after_ms: u64) -> Self {
        let secs = retry_after_ms.div_ceil(1000);
        RateDecision {
            allowed: false,
            remaining_requests: 0,
            retry_after_ms: Some(retry_after_ms),
            message: Some(format!("Too many {} requests. Try again in {}s.", action, secs)),
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after_ms.map(Duration::from_millis)
    }
}

/// Read-only view of an action's limiter state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub action: String,
    pub max_requests: u32,
    pub window_secs: u64,
    /// Requests recorded within the current window.
    pub used: u32,
    pub remaining: u32,
    pub cooling_down: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_remaining_ms: Option<u64>,
}

/// Persisted per-action state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitWindow {
    pub action: String,
    #[serde(default)]
    pub request_timestamps: Vec<u64>,
    #[serde(default)]
    pub cooling_down: bool,
    #[serde(default)]
    pub cooldown_until: Option<u64>,
}

impl RateLimitWindow {
    pub fn new(action: impl Into<String>) -> Self {
        RateLimitWindow { action: action.into(), request_timestamps: Vec::new(), cooling_down: false, cooldown_until: None }
    }

    /// Decide whether a request may proceed now.
    ///
    /// Ends an elapsed cooldown, prunes the window and enters cooldown when
    /// the limit is reached and the policy has one.
    pub fn check(&mut self, policy: &RateLimitPolicy, now_ms: u64) -> RateDecision {
        if let Some(remaining) = self.cooldown_remaining(now_ms) {
            return RateDecision::deny(&self.action, remaining);
        }
        self.end_elapsed_cooldown(now_ms);
        self.prune(policy, now_ms);

        let count = self.used();
        if count < policy.max_requests {
            return RateDecision::allow(policy.max_requests - count);
        }

        match policy.cooldown_ms() {
            Some(cooldown_ms) => {
                self.cooling_down = true;
                self.cooldown_until = Some(now_ms.saturating_add(cooldown_ms));
                self.request_timestamps.clear();
                tracing::info!(action = %self.action, cooldown_ms, "rate limit exceeded, cooling down");
                RateDecision::deny(&self.action, cooldown_ms)
            }
            None => {
                let oldest = self.request_timestamps.iter().copied().min().unwrap_or(now_ms);
                let retry_after = oldest.saturating_add(policy.window_ms()).saturating_sub(now_ms);
                RateDecision::deny(&self.action, retry_after.max(1))
            }
        }
    }

    /// Count a request made at `now_ms`. No-op while cooling down; returns
    /// whether the request was recorded.
    pub fn record(&mut self, policy: &RateLimitPolicy, now_ms: u64) -> bool {
        if self.cooldown_remaining(now_ms).is_some() {
            return false;
        }
        self.end_elapsed_cooldown(now_ms);
        self.prune(policy, now_ms);
        self.request_timestamps.push(now_ms);
        true
    }

    pub fn status(&self, policy: &RateLimitPolicy, now_ms: u64) -> RateLimitStatus {
        let cooldown_remaining_ms = self.cooldown_remaining(now_ms);
        let used = if self.cooling_down {
            // Cleared on entry; stale until the cooldown ends
            0
        } else {
            self.request_timestamps.iter().filter(|&&ts| in_window(policy, ts, now_ms)).count()
        };
        let used = u32::try_from(used).unwrap_or(u32::MAX);
        let remaining = if cooldown_remaining_ms.is_some() { 0 } else { policy.max_requests.saturating_sub(used) };

        RateLimitStatus {
            action: self.action.clone(),
            max_requests: policy.max_requests,
            window_secs: policy.window_secs,
            used,
            remaining,
            cooling_down: cooldown_remaining_ms.is_some(),
            cooldown_remaining_ms,
        }
    }

    pub fn reset(&mut self) {
        self.request_timestamps.clear();
        self.cooling_down = false;
        self.cooldown_until = None;
    }

    fn used(&self) -> u32 {
        u32::try_from(self.request_timestamps.len()).unwrap_or(u32::MAX)
    }

    /// Time left in an active cooldown.
    fn cooldown_remaining(&self, now_ms: u64) -> Option<u64> {
        match (self.cooling_down, self.cooldown_until) {
            (true, Some(until)) if now_ms < until => Some(until - now_ms),
            _ => None,
        }
    }

    fn end_elapsed_cooldown(&mut self, now_ms: u64) {
        if self.cooling_down && self.cooldown_remaining(now_ms).is_none() {
            tracing::debug!(action = %self.action, "cooldown elapsed, window reset");
            self.reset();
        }
    }

    fn prune(&mut self, policy: &RateLimitPolicy, now_ms: u64) {
        self.request_timestamps.retain(|&ts| in_window(policy, ts, now_ms));
    }
}

fn in_window(policy: &RateLimitPolicy, ts: u64, now_ms: u64) -> bool {
    now_ms.saturating_sub(ts) < policy.window_ms()
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;
