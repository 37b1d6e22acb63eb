// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound operations waiting for delivery.
//!
//! An operation is created when a send to the backend fails for a reason
//! attributable to connectivity. It is stored in the pending queue as a
//! camelCase JSON envelope:
//!
//! ```json
//! {"id":"op-1a2b3c4d5e6f","kind":"chat_message","sessionId":"s-1",
//!  "content":"hello","context":{},"createdAt":"2026-01-01T00:00:00Z","retryCount":0}
//! ```
//!
//! The `id` is also the idempotency key handed to the transport, so a
//! redelivered operation can be discarded by the server.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Kind given to operations that don't specify one.
pub const DEFAULT_KIND: &str = "chat_message";

/// Per-process sequence mixed into IDs so identical payloads created within
/// the same instant still get distinct IDs.
static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn default_kind() -> String {
    DEFAULT_KIND.to_string()
}

fn default_context() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// The caller-supplied part of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperation {
    pub kind: String,
    pub session_id: String,
    pub content: String,
    pub context: serde_json::Value,
}

impl NewOperation {
    /// A chat message for the given session with an empty context.
    pub fn chat_message(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        NewOperation {
            kind: default_kind(),
            session_id: session_id.into(),
            content: content.into(),
            context: default_context(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

/// An operation held in the pending queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperation {
    /// Unique identifier, also used as the idempotency key.
    pub id: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub session_id: String,
    pub content: String,
    #[serde(default = "default_context")]
    pub context: serde_json::Value,
    pub created_at: DateTime<Utc>,
    /// Failed delivery attempts so far. Never decreases.
    #[serde(default)]
    pub retry_count: u32,
}

impl QueuedOperation {
    /// Creates a fresh operation with a generated ID and zero retries.
    pub fn new(op: NewOperation, created_at: DateTime<Utc>) -> Self {
        let id = generate_op_id(&op.session_id, &op.content, &created_at);
        QueuedOperation {
            id,
            kind: op.kind,
            session_id: op.session_id,
            content: op.content,
            context: op.context,
            created_at,
            retry_count: 0,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Generate an operation ID.
/// Format: op-{hash} where hash is the first 12 hex chars of
/// SHA256(session + content + timestamp + sequence).
pub fn generate_op_id(session_id: &str, content: &str, created_at: &DateTime<Utc>) -> String {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let input = format!("{}\u{1f}{}\u{1f}{}\u{1f}{}", session_id, content, created_at.to_rfc3339(), seq);
    let hash = Sha256::digest(input.as_bytes());
    format!("op-{}", hex::encode(&hash[..6]))
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
