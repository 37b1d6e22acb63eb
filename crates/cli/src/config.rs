// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration lives in `<data-dir>/config.toml`. Every field has a
//! default, so a missing file or section is not an error:
//!
//! ```toml
//! [queue]
//! max_retries = 3
//!
//! [cache]
//! capacity = 100
//!
//! [rate_limits.chat]
//! max_requests = 20
//! window_secs = 60
//! cooldown_secs = 30
//!
//! [transport]
//! base_url = "https://api.example.com"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::error::{Error, Result};
use crate::limiter::{default_policies, RateLimitPolicy};
use crate::sync::SyncConfig;

const CONFIG_FILE_NAME: &str = "config.toml";
const STORE_DIR_NAME: &str = "store";
const APP_DIR_NAME: &str = "tether";

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub queue: SyncConfig,
    pub cache: CacheConfig,
    /// Per-action overrides layered over the built-in policy table.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub rate_limits: BTreeMap<String, RateLimitPolicy>,
    pub transport: TransportConfig,
    pub connectivity: ConnectivityConfig,
}

/// Backend endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Base URL operations are posted to. Unset means offline only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig { base_url: None, timeout_secs: 15 }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Health probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// URL polled to decide whether the backend is reachable. Defaults to
    /// the transport base URL when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_url: Option<String>,
    pub probe_interval_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        ConnectivityConfig { probe_url: None, probe_interval_secs: 30, probe_timeout_secs: 5 }
    }
}

impl ConnectivityConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Config {
    /// Loads `config.toml` from `data_dir`, or defaults if it doesn't exist.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        let content = match fs::read_to_string(&config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %config_path.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(Error::Config(format!("failed to read {}: {}", config_path.display(), e))),
        };
        let config = Config::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Saves configuration to `data_dir`, creating it if needed.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        fs::create_dir_all(data_dir)?;
        fs::write(data_dir.join(CONFIG_FILE_NAME), self.to_toml()?)?;
        Ok(())
    }

    /// Rejects values that would make a component misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            return Err(Error::InvalidValue { field: "cache.capacity", reason: "must be at least 1".to_string() });
        }
        if self.queue.max_retries == 0 {
            return Err(Error::InvalidValue { field: "queue.max_retries", reason: "must be at least 1".to_string() });
        }
        for (field, secs) in [
            ("transport.timeout_secs", self.transport.timeout_secs),
            ("connectivity.probe_interval_secs", self.connectivity.probe_interval_secs),
            ("connectivity.probe_timeout_secs", self.connectivity.probe_timeout_secs),
        ] {
            if secs == 0 {
                return Err(Error::InvalidValue { field, reason: "must be at least 1 second".to_string() });
            }
        }
        for (action, policy) in &self.rate_limits {
            if policy.max_requests == 0 || policy.window_secs == 0 {
                return Err(Error::InvalidValue {
                    field: "rate_limits",
                    reason: format!("'{}' needs non-zero max_requests and window_secs", action),
                });
            }
        }
        for (field, url) in [
            ("transport.base_url", self.transport.base_url.as_deref()),
            ("connectivity.probe_url", self.connectivity.probe_url.as_deref()),
        ] {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(Error::InvalidValue { field, reason: format!("'{}' is not an http(s) URL", url) });
                }
            }
        }
        Ok(())
    }

    /// Built-in policies with this config's overrides applied.
    pub fn effective_rate_limits(&self) -> BTreeMap<String, RateLimitPolicy> {
        let mut policies = default_policies();
        policies.extend(self.rate_limits.clone());
        policies
    }

    /// URL the connectivity probe polls, if any.
    pub fn probe_url(&self) -> Option<&str> {
        self.connectivity.probe_url.as_deref().or(self.transport.base_url.as_deref())
    }
}

/// Pick the data directory: explicit flag, then `TETHER_DATA_DIR`, then the
/// platform data directory.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_data_dir_from(explicit, crate::env::data_dir(), dirs::data_dir())
}

fn resolve_data_dir_from(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    platform: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = from_env {
        return Ok(dir);
    }
    platform.map(|dir| dir.join(APP_DIR_NAME)).ok_or(Error::NoDataDir)
}

/// Directory backing the file store within `data_dir`.
pub fn store_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_DIR_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
