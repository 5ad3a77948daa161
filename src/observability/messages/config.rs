// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Message types for layer stack and document loading events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An instant layer was added on top of the stack.
///
/// # Log Level
/// `debug!` - Routine stack mutation
pub struct LayerAdded<'a> {
    pub layer: &'a str,
}

impl Display for LayerAdded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Added instant layer '{}'", self.layer)
    }
}

impl StructuredLog for LayerAdded<'_> {
    fn log(&self) {
        tracing::debug!(layer = self.layer, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("layer_added", span_name = name, layer = self.layer)
    }
}

/// A request to remove a static layer was refused.
///
/// # Log Level
/// `warn!` - Caller expectation mismatch
pub struct LayerRemoveRefused<'a> {
    pub layer: &'a str,
}

impl Display for LayerRemoveRefused<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Refusing to remove static layer '{}'", self.layer)
    }
}

impl StructuredLog for LayerRemoveRefused<'_> {
    fn log(&self) {
        tracing::warn!(layer = self.layer, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("layer_remove_refused", span_name = name, layer = self.layer)
    }
}

/// A write to a non-settable layer was rejected.
///
/// # Log Level
/// `warn!` - Caller expectation mismatch
///
/// # Example
/// ```
/// use backplane::observability::messages::config::LayerWriteRefused;
/// use backplane::observability::messages::StructuredLog;
///
/// LayerWriteRefused { layer: "defaults", path: "net/ip" }.log();
/// ```
pub struct LayerWriteRefused<'a> {
    pub layer: &'a str,
    pub path: &'a str,
}

impl Display for LayerWriteRefused<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Layer '{}' is not settable, rejecting write to '{}'",
            self.layer, self.path
        )
    }
}

impl StructuredLog for LayerWriteRefused<'_> {
    fn log(&self) {
        tracing::warn!(layer = self.layer, path = self.path, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "layer_write_refused",
            span_name = name,
            layer = self.layer,
            path = self.path,
        )
    }
}

/// A backing document was merged into a loadable layer.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DocumentLoaded<'a> {
    pub layer: &'a str,
    pub path: &'a str,
}

impl Display for DocumentLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Loaded document '{}' into layer '{}'", self.path, self.layer)
    }
}

impl StructuredLog for DocumentLoaded<'_> {
    fn log(&self) {
        tracing::info!(layer = self.layer, path = self.path, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "document_loaded",
            span_name = name,
            layer = self.layer,
            path = self.path,
        )
    }
}
