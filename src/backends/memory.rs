// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! An in-process backend keeping external objects in plain maps.

use crate::config::LayerStack;
use crate::errors::ControllerError;
use crate::traits::Controller;
use crate::utils::value_tree;
use serde_json::Value;
use std::collections::HashMap;

pub(crate) const ID_FIELD: &str = "Id";

/// True when every field of `filter` matches `element`, recursing into
/// nested mappings so external-shaped filters work at any depth.
pub(crate) fn matches_filter(element: &Value, filter: &Value) -> bool {
    match filter.as_object() {
        Some(fields) => fields.iter().all(|(key, expected)| {
            element
                .get(key)
                .map(|actual| {
                    if expected.is_object() {
                        matches_filter(actual, expected)
                    } else {
                        actual == expected
                    }
                })
                .unwrap_or(false)
        }),
        None => element == filter,
    }
}

#[derive(Debug, Default)]
pub struct MemoryController {
    store: HashMap<String, Vec<Value>>,
    next_id: u64,
    connected: bool,
}

impl MemoryController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn stamp_id(&mut self, type_name: &str, external: &mut Value) -> String {
        self.next_id += 1;
        let id = format!("{}-{}", type_name, self.next_id);
        if !external.is_object() {
            *external = Value::Object(serde_json::Map::new());
        }
        external[ID_FIELD] = Value::String(id.clone());
        id
    }

    fn position(&self, type_name: &str, id: &str) -> Result<usize, ControllerError> {
        self.store
            .get(type_name)
            .and_then(|objects| {
                objects
                    .iter()
                    .position(|o| o[ID_FIELD].as_str() == Some(id))
            })
            .ok_or_else(|| ControllerError::NotFound { id: id.to_string() })
    }
}

impl Controller for MemoryController {
    fn connect(&mut self, _config: &LayerStack) -> Result<(), ControllerError> {
        self.connected = true;
        Ok(())
    }

    fn create(&mut self, type_name: &str, params: &Value) -> Result<Value, ControllerError> {
        let mut external = params.clone();
        self.stamp_id(type_name, &mut external);
        self.store
            .entry(type_name.to_string())
            .or_default()
            .push(external.clone());
        Ok(external)
    }

    fn get(&mut self, type_name: &str, id: &str) -> Result<Value, ControllerError> {
        let index = self.position(type_name, id)?;
        Ok(self.store[type_name][index].clone())
    }

    fn query(&mut self, type_name: &str, filter: &Value) -> Result<Value, ControllerError> {
        let objects = self.store.get(type_name).cloned().unwrap_or_default();
        let matching: Vec<Value> = objects
            .into_iter()
            .filter(|o| filter.is_null() || matches_filter(o, filter))
            .collect();
        Ok(Value::Array(matching))
    }

    fn update(
        &mut self,
        type_name: &str,
        id: &str,
        params: &Value,
    ) -> Result<Value, ControllerError> {
        let index = self.position(type_name, id)?;
        let object = &mut self
            .store
            .get_mut(type_name)
            .expect("position found the type")[index];
        value_tree::deep_merge(object, params);
        Ok(object.clone())
    }

    fn delete(&mut self, type_name: &str, id: &str) -> Result<(), ControllerError> {
        let index = self.position(type_name, id)?;
        self.store
            .get_mut(type_name)
            .expect("position found the type")
            .remove(index);
        Ok(())
    }
}
