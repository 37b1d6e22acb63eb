// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether - client-side resilience layer for an intermittently connected app.
//!
//! This crate provides the components a client needs to keep working while
//! the backend is unreachable, plus the `tether` CLI for inspecting them.
//!
//! # Main Components
//!
//! - [`sync`] - Durable offline queue, sync engine, transport and connectivity
//! - [`cache`] - Two-tier (memory + durable) cache with TTL and LRU eviction
//! - [`limiter`] - Per-action sliding-window rate limiter with cooldown
//! - [`Session`] - Wires the components together for one signed-in user
//! - [`Config`] - Configuration loaded from `<data-dir>/config.toml`
//!
//! # Usage
//!
//! ```rust,ignore
//! use tether::{Config, Session, SessionDeps, Submitted};
//!
//! let mut session = Session::start(deps, &Config::default()).await;
//! match session.submit("chat", NewOperation::chat_message("s-1", "hi")).await? {
//!     Submitted::Sent { .. } => {}
//!     Submitted::Queued { id } => println!("queued {id}"),
//!     Submitted::RateLimited(decision) => println!("{:?}", decision.message),
//! }
//! ```

mod cli;
mod commands;
mod env;

pub mod cache;
pub mod config;
pub mod error;
pub mod limiter;
pub mod session;
pub mod sync;

pub use cli::{CacheCommand, Cli, Command, ConfigCommand, LimitCommand, OutputFormat, QueueCommand};
pub use config::{resolve_data_dir, Config};
pub use error::{Error, Result};
pub use session::{Session, SessionDeps, Submitted};

/// Execute a CLI invocation. This is the main entry point for the binary and
/// provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(commands::dispatch(cli.command, &data_dir, cli.output))
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
