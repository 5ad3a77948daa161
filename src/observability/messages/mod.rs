// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message is a plain struct borrowing the fields it reports. `Display`
//! renders the human-readable line; [`StructuredLog`] emits the same event
//! with structured fields attached.

pub mod config;
pub mod dispatch;

use tracing::Span;

/// Emit a message through `tracing` with structured fields.
pub trait StructuredLog: std::fmt::Display {
    /// Log at the message's natural level.
    fn log(&self);

    /// Create a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
