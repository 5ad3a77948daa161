// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! A backend persisting each object type to a YAML document.
//!
//! One file per type under the root directory, holding the list of external
//! objects. Every mutation rewrites the whole document; this backend is for
//! small inventories and durable test fixtures, not high-volume stores.

use crate::backends::memory::{matches_filter, ID_FIELD};
use crate::config::{LayerScope, LayerStack};
use crate::errors::ControllerError;
use crate::path::AttrPath;
use crate::traits::Controller;
use crate::utils::value_tree;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration attribute naming the storage root.
pub const ROOT_ATTR: &str = "file_backend/root";

#[derive(Debug)]
pub struct FileController {
    root: PathBuf,
    next_id: u64,
}

impl FileController {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        FileController {
            root: root.into(),
            next_id: 0,
        }
    }

    fn document(&self, type_name: &str) -> PathBuf {
        self.root.join(format!("{type_name}.yaml"))
    }

    fn load(&self, type_name: &str) -> Result<Vec<Value>, ControllerError> {
        let path = self.document(type_name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    fn save(&self, type_name: &str, objects: &[Value]) -> Result<(), ControllerError> {
        fs::create_dir_all(&self.root)?;
        let rendered = serde_yaml::to_string(objects)?;
        fs::write(self.document(type_name), rendered)?;
        Ok(())
    }

    fn stamp_id(&mut self, type_name: &str, objects: &[Value], external: &mut Value) -> String {
        // ids must survive restarts; continue past the highest stored one
        let highest = objects
            .iter()
            .filter_map(|o| o[ID_FIELD].as_str())
            .filter_map(|id| id.rsplit('-').next())
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(highest) + 1;

        let id = format!("{}-{}", type_name, self.next_id);
        if !external.is_object() {
            *external = Value::Object(serde_json::Map::new());
        }
        external[ID_FIELD] = Value::String(id.clone());
        id
    }

    fn position(objects: &[Value], id: &str) -> Result<usize, ControllerError> {
        objects
            .iter()
            .position(|o| o[ID_FIELD].as_str() == Some(id))
            .ok_or_else(|| ControllerError::NotFound { id: id.to_string() })
    }
}

impl Controller for FileController {
    /// Re-root the store when the configuration names a storage root, and
    /// make sure the directory exists.
    fn connect(&mut self, config: &LayerStack) -> Result<(), ControllerError> {
        if let Some(root) = config.get(&AttrPath::from(ROOT_ATTR), LayerScope::Any) {
            if let Some(root) = root.as_str() {
                self.root = Path::new(root).to_path_buf();
            }
        }
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    fn create(&mut self, type_name: &str, params: &Value) -> Result<Value, ControllerError> {
        let mut objects = self.load(type_name)?;
        let mut external = params.clone();
        self.stamp_id(type_name, &objects, &mut external);
        objects.push(external.clone());
        self.save(type_name, &objects)?;
        Ok(external)
    }

    fn get(&mut self, type_name: &str, id: &str) -> Result<Value, ControllerError> {
        let objects = self.load(type_name)?;
        let index = Self::position(&objects, id)?;
        Ok(objects[index].clone())
    }

    fn query(&mut self, type_name: &str, filter: &Value) -> Result<Value, ControllerError> {
        let objects = self.load(type_name)?;
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
        let mut objects = self.load(type_name)?;
        let index = Self::position(&objects, id)?;
        value_tree::deep_merge(&mut objects[index], params);
        let updated = objects[index].clone();
        self.save(type_name, &objects)?;
        Ok(updated)
    }

    fn delete(&mut self, type_name: &str, id: &str) -> Result<(), ControllerError> {
        let mut objects = self.load(type_name)?;
        let index = Self::position(&objects, id)?;
        objects.remove(index);
        self.save(type_name, &objects)?;
        Ok(())
    }
}
