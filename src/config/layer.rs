// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! A single named layer of the configuration stack.

use crate::path::AttrPath;
use crate::utils::value_tree;
use serde::Deserialize;
use serde_json::Value;

/// Declarative description of one layer.
///
/// # Fields
/// * `name` - Unique layer name; identity within the stack
/// * `loadable` - Whether a backing document may be merged into the layer
/// * `settable` - Whether runtime writes are accepted
/// * `persistable` - Whether the layer may be serialized back out
///
/// # Example
/// ```yaml
/// name: account
/// loadable: true
/// settable: true
/// persistable: true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LayerDescriptor {
    pub name: String,
    #[serde(default)]
    pub loadable: bool,
    #[serde(default)]
    pub settable: bool,
    #[serde(default)]
    pub persistable: bool,
}

impl LayerDescriptor {
    pub fn new(name: &str) -> Self {
        LayerDescriptor {
            name: name.to_string(),
            loadable: false,
            settable: false,
            persistable: false,
        }
    }

    pub fn loadable(mut self) -> Self {
        self.loadable = true;
        self
    }

    pub fn settable(mut self) -> Self {
        self.settable = true;
        self
    }

    pub fn persistable(mut self) -> Self {
        self.persistable = true;
        self
    }
}

/// A named key/value store with its own read/write/persist policy.
///
/// Statically-declared layers (those present at stack construction) may not
/// be removed; instant layers added at runtime may.
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    loadable: bool,
    settable: bool,
    persistable: bool,
    static_layer: bool,
    store: Value,
}

impl Layer {
    pub fn new(descriptor: LayerDescriptor, static_layer: bool) -> Self {
        Layer {
            name: descriptor.name,
            loadable: descriptor.loadable,
            settable: descriptor.settable,
            persistable: descriptor.persistable,
            static_layer,
            store: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_loadable(&self) -> bool {
        self.loadable
    }

    pub fn is_settable(&self) -> bool {
        self.settable
    }

    pub fn is_persistable(&self) -> bool {
        self.persistable
    }

    pub fn is_static(&self) -> bool {
        self.static_layer
    }

    pub fn get(&self, path: &AttrPath) -> Option<&Value> {
        value_tree::get_at(&self.store, path)
    }

    pub fn holds(&self, path: &AttrPath) -> bool {
        value_tree::exists_at(&self.store, path)
    }

    /// Write a value; `false` when the layer is not settable (silent
    /// rejection, callers check the return value when they care).
    pub fn set(&mut self, path: &AttrPath, value: Value) -> bool {
        if !self.settable {
            return false;
        }
        value_tree::set_at(&mut self.store, path, value)
    }

    /// Remove and return a value. Deletion is allowed regardless of the
    /// settable flag; it targets exactly this layer.
    pub fn remove(&mut self, path: &AttrPath) -> Option<Value> {
        value_tree::remove_at(&mut self.store, path)
    }

    pub fn store(&self) -> &Value {
        &self.store
    }

    /// Merge a loaded document (section -> attribute -> value) into the
    /// store. Refused for non-loadable layers.
    pub fn merge_document(&mut self, document: &Value) -> bool {
        if !self.loadable {
            return false;
        }
        value_tree::deep_merge(&mut self.store, document);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_only_layer_silently_rejects_writes() {
        let mut layer = Layer::new(LayerDescriptor::new("defaults").loadable(), true);
        assert!(!layer.set(&AttrPath::from("section/key"), json!(1)));
        assert!(!layer.holds(&AttrPath::from("section/key")));
    }

    #[test]
    fn settable_layer_accepts_writes_and_deletes() {
        let mut layer = Layer::new(LayerDescriptor::new("runtime").settable(), true);
        assert!(layer.set(&AttrPath::from("section/key"), json!("v")));
        assert_eq!(layer.get(&AttrPath::from("section/key")), Some(&json!("v")));
        assert_eq!(layer.remove(&AttrPath::from("section/key")), Some(json!("v")));
    }

    #[test]
    fn document_merge_respects_loadable_flag() {
        let document = json!({ "net": { "ip": "10.0.0.1" } });

        let mut sealed = Layer::new(LayerDescriptor::new("runtime").settable(), true);
        assert!(!sealed.merge_document(&document));

        let mut open = Layer::new(LayerDescriptor::new("account").loadable().settable(), true);
        assert!(open.merge_document(&document));
        assert_eq!(
            open.get(&AttrPath::from("net/ip")),
            Some(&json!("10.0.0.1"))
        );
    }
}
