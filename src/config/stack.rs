// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! The layered configuration resolver.
//!
//! An ordered stack of named layers; index 0 is the highest priority for
//! reads unless a specific name (or name set) is targeted. Lookup re-scans
//! the stack on every call; nothing is cached across calls, because layers
//! can be added and removed between them. Each lookup is O(layers).

use crate::config::layer::{Layer, LayerDescriptor};
use crate::observability::messages::config::{LayerAdded, LayerRemoveRefused, LayerWriteRefused};
use crate::observability::messages::StructuredLog;
use crate::path::AttrPath;
use crate::utils::value_tree;
use serde_json::Value;

/// Restricts a read to a subset of layer names.
#[derive(Debug, Clone, Copy, Default)]
pub enum LayerScope<'a> {
    #[default]
    Any,
    Name(&'a str),
    Names(&'a [&'a str]),
}

impl LayerScope<'_> {
    fn admits(&self, name: &str) -> bool {
        match self {
            LayerScope::Any => true,
            LayerScope::Name(n) => *n == name,
            LayerScope::Names(names) => names.contains(&name),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    /// Build a stack of static layers, highest priority first.
    pub fn new(descriptors: Vec<LayerDescriptor>) -> Self {
        LayerStack {
            layers: descriptors
                .into_iter()
                .map(|d| Layer::new(d, true))
                .collect(),
        }
    }

    /// The standard three-layer stack: runtime over account over defaults.
    pub fn standard() -> Self {
        use crate::config::consts::{ACCOUNT_LAYER, DEFAULTS_LAYER, RUNTIME_LAYER};
        LayerStack::new(vec![
            LayerDescriptor::new(RUNTIME_LAYER).settable(),
            LayerDescriptor::new(ACCOUNT_LAYER)
                .loadable()
                .settable()
                .persistable(),
            LayerDescriptor::new(DEFAULTS_LAYER).loadable(),
        ])
    }

    /// First non-absent value scanning layers in priority order.
    pub fn get(&self, path: &AttrPath, scope: LayerScope<'_>) -> Option<Value> {
        self.layers
            .iter()
            .filter(|l| scope.admits(l.name()))
            .find_map(|l| l.get(path).cloned())
    }

    /// As [`get`](Self::get), falling back to `default` when absent
    /// everywhere.
    pub fn get_or(&self, path: &AttrPath, default: Value, scope: LayerScope<'_>) -> Value {
        self.get(path, scope).unwrap_or(default)
    }

    /// Write into the named layer, or the highest-priority settable layer
    /// when no name is given. Returns `false` when the write was rejected.
    pub fn set(&mut self, path: &AttrPath, value: Value, name: Option<&str>) -> bool {
        let Some(layer) = self.target_layer(name) else {
            return false;
        };
        let layer_name = layer.name().to_string();
        let accepted = layer.set(path, value);
        if !accepted {
            LayerWriteRefused {
                layer: &layer_name,
                path: &path.to_string(),
            }
            .log();
        }
        accepted
    }

    pub fn exists(&self, path: &AttrPath, scope: LayerScope<'_>) -> bool {
        self.layers
            .iter()
            .filter(|l| scope.admits(l.name()))
            .any(|l| l.holds(path))
    }

    /// Names of the layers currently holding `path`, in priority order;
    /// `None` when nothing holds it.
    pub fn holders(&self, path: &AttrPath, scope: LayerScope<'_>) -> Option<Vec<String>> {
        let names: Vec<String> = self
            .layers
            .iter()
            .filter(|l| scope.admits(l.name()) && l.holds(path))
            .map(|l| l.name().to_string())
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names)
        }
    }

    /// Remove `path` from exactly one layer (named, or the default write
    /// target) and return the removed value. The effective value reverts to
    /// the next layer holding the path.
    pub fn del(&mut self, path: &AttrPath, name: Option<&str>) -> Option<Value> {
        self.target_layer(name)?.remove(path)
    }

    /// Merge container values for `path` across layers, lowest priority
    /// first, so that higher-priority scalar leaves win on conflict.
    ///
    /// Degenerates to plain `get` semantics when the highest-priority holding
    /// layer's value is not a container.
    pub fn merge(&self, path: &AttrPath) -> Option<Value> {
        let holding: Vec<&Value> = self
            .layers
            .iter()
            .filter_map(|l| l.get(path))
            .collect();
        let first = holding.first()?;
        if !first.is_object() {
            return Some((*first).clone());
        }

        let mut accumulator = Value::Object(serde_json::Map::new());
        for value in holding.into_iter().rev() {
            if value.is_object() {
                value_tree::deep_merge(&mut accumulator, value);
            }
        }
        Some(accumulator)
    }

    /// True when at least one holding layer's value is a container; with
    /// `exclusive`, only when every holding layer's value is one.
    pub fn mergeable(&self, path: &AttrPath, exclusive: bool) -> bool {
        let mut any_holder = false;
        let mut any_container = false;
        for layer in &self.layers {
            if let Some(value) = layer.get(path) {
                any_holder = true;
                if value.is_object() {
                    any_container = true;
                } else if exclusive {
                    return false;
                }
            }
        }
        any_holder && any_container
    }

    /// Add an instant (runtime) layer at the top of the stack. Refused when
    /// the name is already taken.
    pub fn add_layer(&mut self, descriptor: LayerDescriptor) -> bool {
        if self.layer(&descriptor.name).is_some() {
            return false;
        }
        LayerAdded {
            layer: &descriptor.name,
        }
        .log();
        self.layers.insert(0, Layer::new(descriptor, false));
        true
    }

    /// Remove an instant layer. Static layers are refused with a failure
    /// indicator, never an error.
    pub fn remove_layer(&mut self, name: &str) -> bool {
        match self.layers.iter().position(|l| l.name() == name) {
            Some(index) if !self.layers[index].is_static() => {
                self.layers.remove(index);
                true
            }
            Some(_) => {
                LayerRemoveRefused { layer: name }.log();
                false
            }
            None => false,
        }
    }

    /// Layer names, highest priority first.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.name() == name)
    }

    fn target_layer(&mut self, name: Option<&str>) -> Option<&mut Layer> {
        match name {
            Some(name) => self.layer_mut(name),
            None => self.layers.iter_mut().find(|l| l.is_settable()),
        }
    }
}
