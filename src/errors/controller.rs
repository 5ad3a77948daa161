// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Errors raised by backend controllers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    /// The backend does not implement this primitive. Controllers must raise
    /// this for unimplemented required operations instead of silently
    /// no-opping.
    #[error("'{primitive}' is not implemented by this controller")]
    NotImplemented { primitive: &'static str },

    #[error("object not found: '{id}'")]
    NotFound { id: String },

    #[error("attribute '{path}' cannot be addressed on this external object")]
    BadAttribute { path: String },

    #[error("backend failure: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
