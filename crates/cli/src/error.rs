// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::cache::CacheError;
use crate::sync::TransportError;

/// Errors surfaced by the tether client library and CLI.
///
/// Storage, queue and limiter failures are mostly absorbed where they occur;
/// what reaches this type is something the caller has to act on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("cannot determine a data directory\n  hint: pass --data-dir or set TETHER_DATA_DIR")]
    NoDataDir,

    #[error("invalid namespace: '{0}'\n  hint: valid namespaces are: user, gamification, api, temp")]
    InvalidNamespace(String),

    #[error("operation not found: {0}")]
    OperationNotFound(String),

    #[error("not cached: {0}")]
    NotCached(String),

    #[error("operation {id} rejected by server: {reason}")]
    Rejected { id: String, reason: String },

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("{0} is not configured\n  hint: set it in config.toml")]
    NotConfigured(&'static str),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("store error: {0}")]
    Store(#[from] tether_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config file: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("cannot write config: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Result type alias for tether operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
