// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether-core: Shared library for the tether resilience layer
//!
//! This crate provides the queued-operation envelope, the durable key-value
//! store contract with its in-memory and file-backed implementations, and
//! the clock abstraction used by the queue, cache and rate limiter.

pub mod clock;
pub mod error;
pub mod op;
pub mod store;

pub use clock::{ClockSource, ManualClock, SharedClock, SystemClock};
pub use error::{Error, Result};
pub use op::{NewOperation, QueuedOperation};
pub use store::{get_json, set_json, DurableStore, FileStore, MemoryStore, StoreFuture};
