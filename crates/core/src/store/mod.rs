// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable key-value storage contract.
//!
//! Everything the resilience layer persists (pending operations, cache
//! entries, rate-limit windows) goes through [`DurableStore`]: string keys,
//! opaque byte values, every call asynchronous and independently failable.
//! Callers treat failures as non-fatal, so implementations should report
//! errors rather than retry internally.

mod file;
mod memory;

use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Asynchronous string-keyed byte storage that survives process restart.
pub trait DurableStore: Send + Sync {
    /// Read a value. Returns `None` if the key is absent.
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>>;

    /// Write a value, replacing any previous one.
    fn set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> StoreFuture<'a, ()>;

    /// Delete a value. Deleting an absent key is not an error.
    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

    /// Delete several values.
    fn multi_remove<'a>(&'a self, keys: &'a [String]) -> StoreFuture<'a, ()>;

    /// List every stored key starting with `prefix`, in sorted order.
    fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, Vec<String>>;
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Read and decode a JSON value.
///
/// A value that exists but doesn't decode is reported as
/// [`Error::CorruptedData`] so callers can log it and move on.
pub async fn get_json<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::CorruptedData { key: key.to_string(), reason: e.to_string() }),
        None => Ok(None),
    }
}

/// Encode a value as JSON and write it.
pub async fn set_json<T: Serialize + ?Sized>(store: &dyn DurableStore, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    store.set(key, bytes).await
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
