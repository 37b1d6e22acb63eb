// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tether-core operations.

use thiserror::Error;

/// All possible errors that can occur in tether-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid key: '{0}'\n  hint: keys must be non-empty")]
    InvalidKey(String),

    #[error("corrupted data under '{key}': {reason}")]
    CorruptedData { key: String, reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for tether-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
