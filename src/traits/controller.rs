// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! The backend controller seam.
//!
//! A controller owns the connection to one backend and exposes the five
//! lifecycle primitives over opaque external values. Every primitive
//! defaults to [`ControllerError::NotImplemented`], so a backend only
//! implements what it actually supports and callers get a hard error
//! instead of a silent no-op for the rest.

use crate::config::LayerStack;
use crate::errors::ControllerError;
use crate::path::AttrPath;
use crate::utils::value_tree;
use serde_json::Value;

pub trait Controller {
    /// Establish the backend connection. Credentials and endpoints come out
    /// of the configuration stack.
    fn connect(&mut self, _config: &LayerStack) -> Result<(), ControllerError> {
        Ok(())
    }

    /// Create one backend object and return its external representation.
    fn create(&mut self, _type_name: &str, _params: &Value) -> Result<Value, ControllerError> {
        Err(ControllerError::NotImplemented {
            primitive: "create",
        })
    }

    /// Fetch one backend object by identifier.
    fn get(&mut self, _type_name: &str, _id: &str) -> Result<Value, ControllerError> {
        Err(ControllerError::NotImplemented { primitive: "get" })
    }

    /// List backend objects matching an external-shaped filter; the result
    /// is an array value.
    fn query(&mut self, _type_name: &str, _filter: &Value) -> Result<Value, ControllerError> {
        Err(ControllerError::NotImplemented { primitive: "query" })
    }

    /// Apply changed parameters to an existing object and return its new
    /// external representation.
    fn update(
        &mut self,
        _type_name: &str,
        _id: &str,
        _params: &Value,
    ) -> Result<Value, ControllerError> {
        Err(ControllerError::NotImplemented {
            primitive: "update",
        })
    }

    /// Destroy one backend object.
    fn delete(&mut self, _type_name: &str, _id: &str) -> Result<(), ControllerError> {
        Err(ControllerError::NotImplemented {
            primitive: "delete",
        })
    }

    /// Read one attribute out of an external value. The default walks the
    /// value tree and yields null for absent attributes; backends with
    /// non-tree externals override this.
    fn get_attr(&self, external: &Value, path: &AttrPath) -> Result<Value, ControllerError> {
        Ok(value_tree::get_at(external, path)
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Write one attribute into an external value.
    fn set_attr(
        &self,
        external: &mut Value,
        path: &AttrPath,
        value: Value,
    ) -> Result<(), ControllerError> {
        if value_tree::set_at(external, path, value) {
            Ok(())
        } else {
            Err(ControllerError::BadAttribute {
                path: path.to_string(),
            })
        }
    }
}
