// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Fatal runtime errors surfaced by the lifecycle dispatcher.
//!
//! Every variant carries the object type and, where meaningful, the lifecycle
//! event, so callers always see one structured error rather than a raw
//! backend exception. Recoverable conditions (a handler returning nothing, an
//! optional input that is absent) are logged and never appear here.

use crate::errors::{ControllerError, DeclarationError};
use crate::path::AttrPath;
use crate::registry::EventKind;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown object type '{type_name}'")]
    UnknownType { type_name: String },

    #[error("dependency loop while resolving '{input}' for {event} of '{type_name}'")]
    DependencyLoop {
        type_name: String,
        event: EventKind,
        input: String,
    },

    #[error("required input '{input}' unresolved for {event} of '{type_name}'")]
    UnresolvedInput {
        type_name: String,
        event: EventKind,
        input: String,
    },

    #[error("{event} handler for '{type_name}' returned an unsupported value kind: {got}")]
    ContractViolation {
        type_name: String,
        event: EventKind,
        got: &'static str,
    },

    #[error("attribute mapping failed for '{type_name}': {reason}")]
    MappingFailed { type_name: String, reason: String },

    #[error("no value-mapping entry for {value} at '{path}' of '{type_name}'")]
    ValueMappingMiss {
        type_name: String,
        path: AttrPath,
        value: Value,
    },

    #[error("controller call failed during {event} of '{type_name}': {source}")]
    Controller {
        type_name: String,
        event: EventKind,
        #[source]
        source: ControllerError,
    },

    #[error(transparent)]
    Declaration(#[from] DeclarationError),
}
