// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! All diagnostic output goes through centralized message types implementing
//! `Display` plus the [`messages::StructuredLog`] trait. This keeps magic
//! strings out of the dispatch and configuration code and gives every event
//! both a human-readable line and structured fields.
//!
//! Messages are organized by subsystem:
//! * `messages::config` - layer stack and document loading events
//! * `messages::dispatch` - lifecycle dispatch events
//!
//! # Usage
//!
//! ```rust
//! use backplane::observability::messages::dispatch::QueryCacheHit;
//! use backplane::observability::messages::StructuredLog;
//!
//! QueryCacheHit { type_name: "server" }.log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, honoring `RUST_LOG`.
///
/// Intended for binaries and examples embedding the library; calling it
/// twice is harmless, the second install is ignored.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
