// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Action whose policy applies to actions without one of their own.
pub const FALLBACK_ACTION: &str = "api";

/// Limits for one action category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_secs: u64,
    /// Blocking period after the limit is exceeded. `None` means callers
    /// only wait for the oldest request to leave the window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_secs: Option<u64>,
}

impl RateLimitPolicy {
    pub const fn new(max_requests: u32, window_secs: u64, cooldown_secs: Option<u64>) -> Self {
        RateLimitPolicy { max_requests, window_secs, cooldown_secs }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn window_ms(&self) -> u64 {
        self.window_secs.saturating_mul(1000)
    }

    pub fn cooldown_ms(&self) -> Option<u64> {
        self.cooldown_secs.map(|secs| secs.saturating_mul(1000))
    }
}

/// Built-in policy table.
pub fn default_policies() -> BTreeMap<String, RateLimitPolicy> {
    [
        ("chat", RateLimitPolicy::new(20, 60, Some(30))),
        ("ocr", RateLimitPolicy::new(10, 60, Some(60))),
        (FALLBACK_ACTION, RateLimitPolicy::new(100, 60, None)),
        ("auth", RateLimitPolicy::new(5, 300, Some(300))),
    ]
    .into_iter()
    .map(|(action, policy)| (action.to_string(), policy))
    .collect()
}
