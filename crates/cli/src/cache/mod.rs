// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Two-tier cache: a bounded in-memory LRU in front of the durable store.
//!
//! Reads check memory first, then the durable tier, promoting valid durable
//! hits back into memory. Writes go to memory immediately and to the durable
//! tier best effort. An entry is valid while `now - written_at < ttl`;
//! expired entries are never returned and are removed when next touched.
//!
//! Eviction only ever affects the memory tier: an evicted entry can still be
//! served (and re-promoted) from the durable store until its TTL lapses.
//!
//! Clearing a namespace bumps a generation counter; background refreshes
//! started before the clear discard their result instead of writing it back.

mod lru;
mod namespace;

use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use tether_core::{get_json, set_json, DurableStore, SharedClock};

pub use lru::LruMap;
pub use namespace::{Namespace, KEY_PREFIX};

/// Error type for cache operations.
///
/// Storage failures never surface here; they are logged and the cache
/// degrades to memory only.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The value could not be represented as JSON.
    #[error("cannot cache value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The fetcher failed and nothing usable was cached.
    #[error("fetch failed for '{key}': {reason}")]
    Fetch { key: String, reason: String },
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Default time-to-live per namespace, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceTtls {
    pub user_secs: u64,
    pub gamification_secs: u64,
    pub api_secs: u64,
    pub temp_secs: u64,
}

impl Default for NamespaceTtls {
    fn default() -> Self {
        NamespaceTtls { user_secs: 24 * 60 * 60, gamification_secs: 5 * 60, api_secs: 5 * 60, temp_secs: 60 }
    }
}

/// Configuration for the hybrid cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries held in memory.
    pub capacity: usize,
    pub ttl: NamespaceTtls,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { capacity: 100, ttl: NamespaceTtls::default() }
    }
}

impl CacheConfig {
    /// Default TTL for entries in `namespace`.
    pub fn ttl_for(&self, namespace: Namespace) -> Duration {
        let secs = match namespace {
            Namespace::User => self.ttl.user_secs,
            Namespace::Gamification => self.ttl.gamification_secs,
            Namespace::Api => self.ttl.api_secs,
            Namespace::Temp => self.ttl.temp_secs,
        };
        Duration::from_secs(secs)
    }
}

/// A cached value with its freshness metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub value: serde_json::Value,
    /// Write time, milliseconds since the Unix epoch.
    pub written_at: u64,
    pub ttl_ms: u64,
}

impl CacheEntry {
    pub fn is_valid(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.written_at) < self.ttl_ms
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self, now_ms: u64) -> Duration {
        let expires_at = self.written_at.saturating_add(self.ttl_ms);
        Duration::from_millis(expires_at.saturating_sub(now_ms))
    }
}

/// Options for [`HybridCache::set`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    /// Overrides the namespace default TTL.
    pub ttl: Option<Duration>,
}

impl SetOptions {
    pub fn ttl(ttl: Duration) -> Self {
        SetOptions { ttl: Some(ttl) }
    }
}

/// Options for [`HybridCache::get_or_fetch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Overrides the namespace default TTL for the fetched value.
    pub ttl: Option<Duration>,
    /// Serve a cached value immediately and refresh it in the background.
    pub stale_while_revalidate: bool,
}

/// Counters describing cache behavior since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Inner {
    store: Arc<dyn DurableStore>,
    clock: SharedClock,
    config: CacheConfig,
    memory: Mutex<LruMap<CacheEntry>>,
    /// Keys with a background refresh in progress.
    refreshing: Mutex<HashSet<String>>,
    /// Bumped by every clear.
    generation: AtomicU64,
    /// Held shared by refresh writes and exclusively by clears.
    write_gate: RwLock<()>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Memory + durable cache. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct HybridCache {
    inner: Arc<Inner>,
}

impl HybridCache {
    pub fn new(store: Arc<dyn DurableStore>, clock: SharedClock, config: CacheConfig) -> Self {
        let memory = Mutex::new(LruMap::new(config.capacity));
        HybridCache {
            inner: Arc::new(Inner {
                store,
                clock,
                config,
                memory,
                refreshing: Mutex::new(HashSet::new()),
                generation: AtomicU64::new(0),
                write_gate: RwLock::new(()),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Read a value.
    ///
    /// Returns `None` on a miss, on expiry, or if the cached value doesn't
    /// decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, namespace: Namespace, key: &str) -> Option<T> {
        let full_key = namespace.key(key);
        let entry = self.lookup(&full_key).await?;
        decode(&entry)
    }

    /// Read the raw entry, including its metadata.
    pub async fn get_entry(&self, namespace: Namespace, key: &str) -> Option<CacheEntry> {
        self.lookup(&namespace.key(key)).await
    }

    /// Write a value to both tiers.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        namespace: Namespace,
        key: &str,
        value: &T,
        options: SetOptions,
    ) -> CacheResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|source| CacheError::Encode { key: namespace.key(key), source })?;
        self.write_entry(namespace, key, value, options.ttl).await;
        Ok(())
    }

    /// Return the cached value, or fetch, cache and return a fresh one.
    ///
    /// With `stale_while_revalidate`, a cached value is returned at once and
    /// a background task refreshes it; a failed refresh leaves the cached
    /// entry in place until its TTL lapses. At most one refresh per key runs
    /// at a time.
    pub async fn get_or_fetch<T, F, Fut, E>(
        &self,
        namespace: Namespace,
        key: &str,
        options: FetchOptions,
        fetcher: F,
    ) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let full_key = namespace.key(key);

        if let Some(value) = self.lookup(&full_key).await.as_ref().and_then(decode::<T>) {
            if options.stale_while_revalidate {
                self.spawn_refresh(namespace, key, options.ttl, fetcher);
            }
            return Ok(value);
        }

        let value = fetcher().await.map_err(|e| CacheError::Fetch { key: full_key, reason: e.to_string() })?;
        let encoded =
            serde_json::to_value(&value).map_err(|source| CacheError::Encode { key: namespace.key(key), source })?;
        self.write_entry(namespace, key, encoded, options.ttl).await;
        Ok(value)
    }

    /// Remove one key from both tiers.
    pub async fn remove(&self, namespace: Namespace, key: &str) {
        let full_key = namespace.key(key);
        self.inner.memory.lock().remove(&full_key);
        if let Err(e) = self.inner.store.remove(&full_key).await {
            tracing::warn!(key = %full_key, "cache remove from durable store failed: {}", e);
        }
    }

    /// Remove every key in `namespace` from both tiers.
    pub async fn clear(&self, namespace: Namespace) {
        let _gate = self.inner.write_gate.write().await;
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        let prefix = namespace.prefix();
        let removed = self.inner.memory.lock().retain(|key, _| !key.starts_with(&prefix));

        let store = self.inner.store.as_ref();
        match store.keys_with_prefix(&prefix).await {
            Ok(keys) => {
                if let Err(e) = store.multi_remove(&keys).await {
                    tracing::warn!(namespace = %namespace, "cache clear in durable store failed: {}", e);
                }
            }
            Err(e) => tracing::warn!(namespace = %namespace, "cannot list durable cache keys: {}", e),
        }
        tracing::debug!(namespace = %namespace, memory_entries = removed, "cleared cache namespace");
    }

    /// Clear every namespace.
    pub async fn clear_all(&self) {
        for namespace in Namespace::ALL {
            self.clear(namespace).await;
        }
    }

    /// Drop expired entries from both tiers. Returns the number of distinct
    /// keys removed.
    pub async fn prune_expired(&self) -> usize {
        let now = self.inner.clock.now_ms();
        let mut removed: HashSet<String> = HashSet::new();

        {
            let mut memory = self.inner.memory.lock();
            let expired: Vec<String> = memory
                .keys_by_recency()
                .into_iter()
                .filter(|key| memory.peek(key).is_some_and(|entry| !entry.is_valid(now)))
                .collect();
            for key in expired {
                memory.remove(&key);
                removed.insert(key);
            }
        }

        let store = self.inner.store.as_ref();
        let keys = match store.keys_with_prefix(KEY_PREFIX).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("cannot list durable cache keys: {}", e);
                return removed.len();
            }
        };

        let mut expired = Vec::new();
        for key in keys {
            match get_json::<CacheEntry>(store, &key).await {
                Ok(Some(entry)) if entry.is_valid(now) => {}
                Ok(None) => {}
                // Expired or undecodable
                _ => expired.push(key),
            }
        }
        if let Err(e) = store.multi_remove(&expired).await {
            tracing::warn!("cannot prune durable cache entries: {}", e);
        } else {
            removed.extend(expired);
        }

        removed.len()
    }

    pub fn stats(&self) -> CacheStats {
        let memory = self.inner.memory.lock();
        CacheStats {
            entries: memory.len(),
            capacity: memory.capacity(),
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            evictions: self.inner.evictions.load(Ordering::Relaxed),
        }
    }

    /// Whether a background refresh is running for `key`.
    pub fn is_refreshing(&self, namespace: Namespace, key: &str) -> bool {
        self.inner.refreshing.lock().contains(&namespace.key(key))
    }

    /// Find a valid entry in memory, then in the durable tier.
    async fn lookup(&self, full_key: &str) -> Option<CacheEntry> {
        let now = self.inner.clock.now_ms();

        {
            let mut memory = self.inner.memory.lock();
            match memory.get(full_key) {
                Some(entry) if entry.is_valid(now) => {
                    let entry = entry.clone();
                    drop(memory);
                    self.inner.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry);
                }
                Some(_) => {
                    memory.remove(full_key);
                }
                None => {}
            }
        }

        let store = self.inner.store.as_ref();
        let stale = match get_json::<CacheEntry>(store, full_key).await {
            Ok(Some(entry)) if entry.is_valid(now) => {
                self.insert_memory(entry.clone());
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry);
            }
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(key = %full_key, "cache read from durable store failed: {}", e);
                matches!(e, tether_core::Error::CorruptedData { .. })
            }
        };

        if stale {
            if let Err(e) = store.remove(full_key).await {
                tracing::warn!(key = %full_key, "cannot remove expired cache entry: {}", e);
            }
        }
        self.inner.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    async fn write_entry(&self, namespace: Namespace, key: &str, value: serde_json::Value, ttl: Option<Duration>) {
        let full_key = namespace.key(key);
        let ttl = ttl.unwrap_or_else(|| self.inner.config.ttl_for(namespace));
        let entry = CacheEntry {
            key: full_key.clone(),
            value,
            written_at: self.inner.clock.now_ms(),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        };

        self.insert_memory(entry.clone());
        if let Err(e) = set_json(self.inner.store.as_ref(), &full_key, &entry).await {
            tracing::warn!(key = %full_key, "cache write to durable store failed: {}", e);
        }
    }

    /// Write a refreshed value unless the cache was cleared after the
    /// refresh started at `generation`.
    async fn write_refreshed(
        &self,
        namespace: Namespace,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
        generation: u64,
    ) {
        let _gate = self.inner.write_gate.read().await;
        if self.inner.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(key = %namespace.key(key), "cache cleared during refresh, discarding result");
            return;
        }
        self.write_entry(namespace, key, value, ttl).await;
    }

    fn insert_memory(&self, entry: CacheEntry) {
        let evicted = self.inner.memory.lock().insert(entry.key.clone(), entry);
        if let Some((key, _)) = evicted {
            self.inner.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "evicted least recently used cache entry");
        }
    }

    fn spawn_refresh<T, F, Fut, E>(&self, namespace: Namespace, key: &str, ttl: Option<Duration>, fetcher: F)
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let full_key = namespace.key(key);
        if !self.inner.refreshing.lock().insert(full_key.clone()) {
            tracing::debug!(key = %full_key, "refresh already in progress");
            return;
        }

        let generation = self.inner.generation.load(Ordering::SeqCst);
        let cache = self.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            match fetcher().await {
                Ok(value) => {
                    let encoded = serde_json::to_value(&value);
                    match encoded {
                        Ok(value) => cache.write_refreshed(namespace, &key, value, ttl, generation).await,
                        Err(e) => {
                            tracing::warn!(key = %full_key, "background refresh produced an uncacheable value: {}", e)
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(key = %full_key, "background refresh failed, keeping cached value: {}", e);
                }
            }
            cache.inner.refreshing.lock().remove(&full_key);
        });
    }
}

fn decode<T: DeserializeOwned>(entry: &CacheEntry) -> Option<T> {
    match serde_json::from_value(entry.value.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(key = %entry.key, "cached value has unexpected shape: {}", e);
            None
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
