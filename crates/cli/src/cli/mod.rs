// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cache::Namespace;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "tether")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and drive the offline queue, cache and rate limiter")]
#[command(
    long_about = "Inspect and drive the offline resilience layer.\n\n\
    Operations queued while offline are kept in a durable store and delivered in order \
    once the backend is reachable. The same store backs a TTL cache and per-action rate limits."
)]
pub struct Cli {
    /// Directory holding config.toml and the durable store
    #[arg(long, global = true, value_name = "path")]
    pub data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short = 'o', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Inspect and edit pending operations
    Queue {
        #[command(subcommand)]
        command: QueueCommand,
    },

    /// Deliver pending operations to the configured backend
    #[command(after_help = "\
Examples:
  tether sync                      Drain the queue once
  tether sync -o json              Print the sync report as JSON")]
    Sync,

    /// Read and write cached values
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Check and record rate-limited actions
    Limit {
        #[command(subcommand)]
        command: LimitCommand,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// List pending operations, oldest first
    List,

    /// Queue an operation for delivery
    #[command(after_help = "\
Examples:
  tether queue add \"hello\"                       Queue a chat message
  tether queue add \"hi\" --session s-1            Queue for a specific session
  tether queue add \"x\" --context '{\"k\":1}'       Attach JSON context")]
    Add {
        /// Operation content
        #[arg(value_parser = non_empty_string)]
        content: String,

        /// Session the operation belongs to
        #[arg(long, default_value = "cli")]
        session: String,

        /// Operation kind
        #[arg(long, default_value = tether_core::op::DEFAULT_KIND)]
        kind: String,

        /// JSON object attached to the operation
        #[arg(long)]
        context: Option<String>,
    },

    /// Remove a pending operation
    Remove {
        /// Operation ID
        id: String,
    },

    /// Discard every pending operation
    Clear,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Print a cached value
    Get {
        /// Namespace (user, gamification, api, temp)
        namespace: Namespace,
        key: String,
    },

    /// Cache a value
    #[command(after_help = "\
Examples:
  tether cache set user profile '{\"name\":\"ada\"}'   Cache a JSON value
  tether cache set temp token abc --ttl 30          Cache a string for 30 seconds")]
    Set {
        /// Namespace (user, gamification, api, temp)
        namespace: Namespace,
        key: String,

        /// Value, parsed as JSON when possible
        value: String,

        /// Time to live in seconds (default: the namespace default)
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Remove a cached value
    Remove {
        /// Namespace (user, gamification, api, temp)
        namespace: Namespace,
        key: String,
    },

    /// Remove every value in a namespace, or in all namespaces
    Clear {
        /// Namespace to clear (default: all)
        namespace: Option<Namespace>,
    },

    /// Remove expired entries
    Prune,
}

#[derive(Subcommand)]
pub enum LimitCommand {
    /// Check whether an action may proceed, without recording it
    Check { action: String },

    /// Record one request for an action
    Record { action: String },

    /// Show usage for an action, or for every configured action
    Status { action: Option<String> },

    /// Reset an action, or every action
    Reset { action: Option<String> },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Print the data directory in use
    Path,
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
