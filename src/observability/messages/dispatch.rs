// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Message types for lifecycle dispatch events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A missing dependency was satisfied by a recursive create.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use backplane::observability::messages::dispatch::DependencyAutoCreated;
/// use backplane::observability::messages::StructuredLog;
///
/// DependencyAutoCreated { type_name: "server", input: "network" }.log();
/// ```
pub struct DependencyAutoCreated<'a> {
    pub type_name: &'a str,
    pub input: &'a str,
}

impl Display for DependencyAutoCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Auto-created dependency '{}' for '{}'",
            self.input, self.type_name
        )
    }
}

impl StructuredLog for DependencyAutoCreated<'_> {
    fn log(&self) {
        tracing::info!(type_name = self.type_name, input = self.input, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "dependency_auto_created",
            span_name = name,
            type_name = self.type_name,
            input = self.input,
        )
    }
}

/// A handler declined to act by returning nothing.
///
/// # Log Level
/// `warn!` for create, where a result was expected; callers log get/update
/// declines at `debug!` themselves.
pub struct HandlerReturnedNothing<'a> {
    pub type_name: &'a str,
    pub event: &'a str,
}

impl Display for HandlerReturnedNothing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Handler for '{}' returned nothing on {}",
            self.type_name, self.event
        )
    }
}

impl StructuredLog for HandlerReturnedNothing<'_> {
    fn log(&self) {
        tracing::warn!(type_name = self.type_name, event = self.event, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "handler_returned_nothing",
            span_name = name,
            type_name = self.type_name,
            event = self.event,
        )
    }
}

/// An optional input was absent and skipped during input resolution.
///
/// # Log Level
/// `debug!` - Routine resolution detail
pub struct OptionalInputSkipped<'a> {
    pub type_name: &'a str,
    pub input: &'a str,
}

impl Display for OptionalInputSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Optional input '{}' absent for '{}', skipping",
            self.input, self.type_name
        )
    }
}

impl StructuredLog for OptionalInputSkipped<'_> {
    fn log(&self) {
        tracing::debug!(type_name = self.type_name, input = self.input, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "optional_input_skipped",
            span_name = name,
            type_name = self.type_name,
            input = self.input,
        )
    }
}

/// A query was answered from the cached result list.
///
/// # Log Level
/// `debug!` - Routine cache detail
pub struct QueryCacheHit<'a> {
    pub type_name: &'a str,
}

impl Display for QueryCacheHit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Query for '{}' answered from cache", self.type_name)
    }
}

impl StructuredLog for QueryCacheHit<'_> {
    fn log(&self) {
        tracing::debug!(type_name = self.type_name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("query_cache_hit", span_name = name, type_name = self.type_name)
    }
}

/// An update was suppressed because the read-back found no differences.
///
/// # Log Level
/// `debug!` - Routine suppression detail
pub struct UpdateSkippedNoChanges<'a> {
    pub type_name: &'a str,
}

impl Display for UpdateSkippedNoChanges<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Update for '{}' skipped, no attribute differs from the backend",
            self.type_name
        )
    }
}

impl StructuredLog for UpdateSkippedNoChanges<'_> {
    fn log(&self) {
        tracing::debug!(type_name = self.type_name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "update_skipped",
            span_name = name,
            type_name = self.type_name,
        )
    }
}
