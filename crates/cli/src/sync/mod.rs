// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline delivery of outbound operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Engine    │────►│  Transport  │────►│   Backend   │
//! │(SyncEngine) │     │   (trait)   │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!     │     ▲
//!     ▼     │ online/offline
//! ┌────────────┐  ┌──────────────┐
//! │   Queue    │  │ Connectivity │
//! │(OfflineQ.) │  │   (watch)    │
//! └────────────┘  └──────────────┘
//! ```
//!
//! # Features
//!
//! - Durable FIFO queue of undelivered operations
//! - Single-flight drains with bounded retries
//! - Dropped operations reported explicitly, never silently lost
//! - Background worker: drain on reconnect, on request, and with
//!   exponential backoff while transient failures remain
//! - Injectable transport and connectivity traits for testing

mod connectivity;
mod engine;
mod queue;
mod transport;

pub use connectivity::{Connectivity, ConnectivityHandle, HttpProbe};
pub use engine::{
    Backoff, DropReason, DroppedOperation, SkipReason, SyncConfig, SyncEngine, SyncEvent, SyncFailure,
    SyncReport, SyncWorker,
};
pub use queue::{OfflineQueue, QUEUE_KEY};
pub use transport::{
    classify_status, HttpTransport, SendFuture, Transport, TransportError, TransportResult, IDEMPOTENCY_HEADER,
};

#[cfg(test)]
pub(crate) mod test_helpers;

#[cfg(test)]
pub(crate) mod transport_tests;
