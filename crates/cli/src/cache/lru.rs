// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Capacity-bounded map with least-recently-used eviction.
//!
//! Every read or write stamps the entry with a monotonically increasing
//! counter; an ordered index from stamp to key gives the least recently
//! accessed entry in O(log n).

use std::collections::{BTreeMap, HashMap};

struct Slot<V> {
    value: V,
    stamp: u64,
}

pub struct LruMap<V> {
    entries: HashMap<String, Slot<V>>,
    order: BTreeMap<u64, String>,
    tick: u64,
    capacity: usize,
}

impl<V> LruMap<V> {
    /// A map holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        LruMap { entries: HashMap::new(), order: BTreeMap::new(), tick: 0, capacity: capacity.max(1) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read an entry, marking it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        self.touch(key);
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Read an entry without affecting eviction order.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Insert or replace an entry, marking it most recently used.
    ///
    /// Returns the entry evicted to make room, if any. Replacing an existing
    /// key never evicts.
    pub fn insert(&mut self, key: String, value: V) -> Option<(String, V)> {
        self.tick += 1;
        let stamp = self.tick;

        if let Some(slot) = self.entries.get_mut(&key) {
            self.order.remove(&slot.stamp);
            slot.value = value;
            slot.stamp = stamp;
            self.order.insert(stamp, key);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity { self.evict_oldest() } else { None };
        self.order.insert(stamp, key.clone());
        self.entries.insert(key, Slot { value, stamp });
        evicted
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let slot = self.entries.remove(key)?;
        self.order.remove(&slot.stamp);
        Some(slot.value)
    }

    /// Keep only entries for which `keep` returns true. Returns how many were
    /// removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &V) -> bool) -> usize {
        let doomed: Vec<String> =
            self.entries.iter().filter(|(key, slot)| !keep(key, &slot.value)).map(|(key, _)| key.clone()).collect();
        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.order.values().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: &str) {
        if let Some(slot) = self.entries.get_mut(key) {
            self.tick += 1;
            self.order.remove(&slot.stamp);
            slot.stamp = self.tick;
            self.order.insert(self.tick, key.to_string());
        }
    }

    fn evict_oldest(&mut self) -> Option<(String, V)> {
        let (_, key) = self.order.pop_first()?;
        let slot = self.entries.remove(&key)?;
        Some((key, slot.value))
    }
}

#[cfg(test)]
#[path = "lru_tests.rs"]
mod tests;
