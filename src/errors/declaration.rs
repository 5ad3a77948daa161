// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Errors raised while declaring object types and their mappings.
//!
//! Every condition here is a programming error in the declaration phase, not a
//! runtime failure: the registry refuses the declaration and the process
//! definition must be fixed before a dispatcher can be built from it.

use crate::path::PathError;
use std::fmt;

/// Errors that can occur during object-type declaration
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationError {
    /// A declaration call was made with no object type currently being declared
    NoCurrentType {
        /// The declaration call that was attempted
        call: &'static str,
    },
    /// A required input of kind nested-object references a type that was never declared
    UnknownNestedType {
        /// The type whose declaration contains the reference
        type_name: String,
        /// The nested object type that couldn't be resolved
        missing_type: String,
    },
    /// A declaration referenced an object type that does not exist
    UnknownType {
        type_name: String,
    },
    /// An attribute path in a declaration failed to parse
    MalformedPath {
        raw: String,
    },
}

impl fmt::Display for DeclarationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationError::NoCurrentType { call } => {
                write!(
                    f,
                    "'{}' called outside of an active object-type declaration",
                    call
                )
            }
            DeclarationError::UnknownNestedType {
                type_name,
                missing_type,
            } => {
                write!(
                    f,
                    "Object type '{}' requires nested type '{}' which was never declared",
                    type_name, missing_type
                )
            }
            DeclarationError::UnknownType { type_name } => {
                write!(f, "Unknown object type: '{}'", type_name)
            }
            DeclarationError::MalformedPath { raw } => {
                write!(f, "Malformed attribute path in declaration: '{}'", raw)
            }
        }
    }
}

impl std::error::Error for DeclarationError {}

impl From<PathError> for DeclarationError {
    fn from(err: PathError) -> Self {
        DeclarationError::MalformedPath { raw: err.raw }
    }
}
