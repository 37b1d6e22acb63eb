// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for delivering queued operations.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTP delivery to the backend for production
//! - Mock transports for unit testing
//!
//! Transports must treat [`QueuedOperation::id`] as an idempotency key:
//! a send whose acknowledgment was lost will be retried, so delivery is
//! at-least-once and the backend discards duplicates by ID.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tether_core::QueuedOperation;

/// Header carrying the operation ID on HTTP sends.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The backend could not be reached.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The backend failed or asked us to back off.
    #[error("server error: HTTP {0}")]
    Server(u16),

    /// The backend refused the operation; retrying won't help.
    #[error("rejected by server: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Whether the operation should be dropped instead of retried.
    pub fn is_permanent(&self) -> bool {
        matches!(self, TransportError::Rejected(_))
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport::send`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = TransportResult<()>> + Send + 'a>>;

/// Transport trait for delivering operations to the backend.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send + Sync {
    /// Deliver one operation.
    fn send<'a>(&'a self, op: &'a QueuedOperation) -> SendFuture<'a>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send<'a>(&'a self, op: &'a QueuedOperation) -> SendFuture<'a> {
        (**self).send(op)
    }
}

/// Map an HTTP status to a transport outcome.
///
/// 2xx is delivered; 408, 429 and 5xx are worth retrying; every other
/// status is a permanent rejection.
pub fn classify_status(status: u16, body: &str) -> TransportResult<()> {
    match status {
        200..=299 => Ok(()),
        408 | 429 | 500..=599 => Err(TransportError::Server(status)),
        _ => {
            let reason = if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, body.trim())
            };
            Err(TransportError::Rejected(reason))
        }
    }
}

/// HTTP transport implementation using reqwest.
///
/// Each operation is POSTed as its JSON envelope to `<base_url>/operations`.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport for the given backend with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        Ok(HttpTransport { client, endpoint: format!("{}/operations", base_url.trim_end_matches('/')) })
    }

    /// URL operations are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, op: &'a QueuedOperation) -> SendFuture<'a> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.endpoint)
                .header(IDEMPOTENCY_HEADER, &op.id)
                .json(op)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        TransportError::Timeout
                    } else {
                        TransportError::Unreachable(e.to_string())
                    }
                })?;

            let status = response.status().as_u16();
            if response.status().is_success() {
                return Ok(());
            }

            let body = response.text().await.unwrap_or_default();
            classify_status(status, &body)
        })
    }
}
