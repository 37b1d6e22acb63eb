// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod cache;
pub mod config;
pub mod limit;
pub mod queue;
pub mod sync;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use tether_core::{DurableStore, FileStore, SharedClock, SystemClock};

use crate::cache::HybridCache;
use crate::cli::{Command, OutputFormat};
use crate::config::{store_dir, Config};
use crate::error::Result;
use crate::limiter::RateLimiter;
use crate::sync::OfflineQueue;

/// Everything a command needs: configuration plus the file-backed store.
pub struct Context {
    pub config: Config,
    pub store: Arc<dyn DurableStore>,
    pub clock: SharedClock,
    pub output: OutputFormat,
}

impl Context {
    /// Load configuration from `data_dir` and open its store.
    pub fn open(data_dir: &Path, output: OutputFormat) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let store = FileStore::open(store_dir(data_dir))?;
        Ok(Context {
            config,
            store: Arc::new(store),
            clock: Arc::new(SystemClock),
            output,
        })
    }

    pub async fn queue(&self) -> OfflineQueue {
        OfflineQueue::open(Arc::clone(&self.store), Arc::clone(&self.clock)).await
    }

    pub fn cache(&self) -> HybridCache {
        HybridCache::new(Arc::clone(&self.store), Arc::clone(&self.clock), self.config.cache.clone())
    }

    pub fn limiter(&self) -> RateLimiter {
        RateLimiter::new(Arc::clone(&self.store), Arc::clone(&self.clock), self.config.rate_limits.clone())
    }

    pub fn is_json(&self) -> bool {
        self.output == OutputFormat::Json
    }
}

/// Run one parsed command against `data_dir`.
pub async fn dispatch(command: Command, data_dir: &Path, output: OutputFormat) -> Result<()> {
    match command {
        Command::Config { command } => config::run(command, data_dir, output),
        Command::Queue { command } => queue::run(&Context::open(data_dir, output)?, command).await,
        Command::Sync => sync::run(&Context::open(data_dir, output)?).await,
        Command::Cache { command } => cache::run(&Context::open(data_dir, output)?, command).await,
        Command::Limit { command } => limit::run(&Context::open(data_dir, output)?, command).await,
    }
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
