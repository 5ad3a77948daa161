// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Object-type descriptors.
//!
//! A descriptor is the registry entry for one abstract object type: the
//! handler registered for each lifecycle event, the inputs a handler call
//! requires, and the declarative mapping tables that translate between the
//! process-level attribute view and the controller-level external view.
//!
//! Handlers are first-class closure values stored directly in the descriptor.
//! Dispatch is a direct call through the stored `Arc`, never a name lookup,
//! and capability probing is a plain `Option` check on the slot.

use crate::data::ParamBag;
use crate::dispatch::{HandlerCtx, HandlerValue};
use crate::errors::DispatchError;
use crate::path::AttrPath;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// The five lifecycle events an object type can handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Create,
    Delete,
    Update,
    Get,
    Query,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Create,
        EventKind::Delete,
        EventKind::Update,
        EventKind::Get,
        EventKind::Query,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Create => "create",
            EventKind::Delete => "delete",
            EventKind::Update => "update",
            EventKind::Get => "get",
            EventKind::Query => "query",
        };
        write!(f, "{}", name)
    }
}

/// A process-level handler for create/delete/update/get.
pub type Handler =
    Arc<dyn Fn(&mut HandlerCtx<'_>, &mut ParamBag) -> Result<HandlerValue, DispatchError>>;

/// A process-level query handler; receives the query signature as well.
pub type QueryHandler =
    Arc<dyn Fn(&mut HandlerCtx<'_>, &Value, &mut ParamBag) -> Result<HandlerValue, DispatchError>>;

/// One nilable handler slot per lifecycle event.
#[derive(Default, Clone)]
pub struct HandlerSet {
    pub create: Option<Handler>,
    pub delete: Option<Handler>,
    pub update: Option<Handler>,
    pub get: Option<Handler>,
    pub query: Option<QueryHandler>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `other` into this set; slots present in `other` win.
    pub fn merge(&mut self, other: HandlerSet) {
        if other.create.is_some() {
            self.create = other.create;
        }
        if other.delete.is_some() {
            self.delete = other.delete;
        }
        if other.update.is_some() {
            self.update = other.update;
        }
        if other.get.is_some() {
            self.get = other.get;
        }
        if other.query.is_some() {
            self.query = other.query;
        }
    }

    /// True when a handler is registered for `event`.
    pub fn has(&self, event: EventKind) -> bool {
        match event {
            EventKind::Create => self.create.is_some(),
            EventKind::Delete => self.delete.is_some(),
            EventKind::Update => self.update.is_some(),
            EventKind::Get => self.get.is_some(),
            EventKind::Query => self.query.is_some(),
        }
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSet")
            .field("create", &self.create.is_some())
            .field("delete", &self.delete.is_some())
            .field("update", &self.update.is_some())
            .field("get", &self.get.is_some())
            .field("query", &self.query.is_some())
            .finish()
    }
}

/// Whether a required input is plain data or a nested object dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    Data,
    NestedObject,
}

/// One required-input entry of a descriptor.
#[derive(Debug, Clone)]
pub struct RequiredInput {
    pub path: AttrPath,
    pub kind: InputKind,
    pub required: bool,
    /// Events this input applies to.
    pub events: HashSet<EventKind>,
    pub default: Option<Value>,
    /// Pull the value from another already-resolved path instead of the
    /// configuration stack.
    pub extract_from: Option<AttrPath>,
    /// Where the value lands in the flattened external-parameter view.
    pub external_name: Option<AttrPath>,
}

impl RequiredInput {
    pub fn applies_to(&self, event: EventKind) -> bool {
        self.events.contains(&event)
    }

    /// The nested object type this input refers to (head segment), for
    /// `NestedObject` inputs.
    pub fn object_type(&self) -> Option<&str> {
        match self.kind {
            InputKind::NestedObject => self.path.head(),
            InputKind::Data => None,
        }
    }
}

/// Declaration options for [`TypeRegistry::require_input`].
///
/// `required: None` defers to the registry's "optional from here on" toggle.
/// An empty `events` list means the input applies to every event.
#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    pub kind: InputKind,
    pub required: Option<bool>,
    pub events: Vec<EventKind>,
    pub default: Option<Value>,
    pub extract_from: Option<AttrPath>,
    pub external_name: Option<AttrPath>,
}

/// Bidirectional process-value / external-value translation for one attribute.
///
/// Tables are small, so lookup is a linear scan over the declared pairs.
/// A lookup miss on a table that exists is a fatal contract violation at the
/// call site, not here.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    pairs: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn insert(&mut self, process: Value, external: Value) {
        self.pairs.retain(|(p, _)| p != &process);
        self.pairs.push((process, external));
    }

    pub fn to_external(&self, process: &Value) -> Option<&Value> {
        self.pairs.iter().find(|(p, _)| p == process).map(|(_, e)| e)
    }

    pub fn to_process(&self, external: &Value) -> Option<&Value> {
        self.pairs.iter().find(|(_, e)| e == external).map(|(p, _)| p)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// The registry entry for one object type.
#[derive(Debug, Clone, Default)]
pub struct TypeDescriptor {
    pub name: String,
    pub handlers: HandlerSet,
    pub inputs: Vec<RequiredInput>,
    /// external attribute path -> process attribute path, in declaration order.
    pub return_map: Vec<(AttrPath, AttrPath)>,
    /// process query field -> external query field.
    pub query_fields: Vec<(AttrPath, AttrPath)>,
    /// per-attribute value translation, keyed by process attribute path.
    pub value_maps: std::collections::HashMap<AttrPath, ValueMap>,
}

impl TypeDescriptor {
    pub fn new(name: &str) -> Self {
        TypeDescriptor {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn handler(&self, event: EventKind) -> Option<Handler> {
        match event {
            EventKind::Create => self.handlers.create.clone(),
            EventKind::Delete => self.handlers.delete.clone(),
            EventKind::Update => self.handlers.update.clone(),
            EventKind::Get => self.handlers.get.clone(),
            EventKind::Query => None,
        }
    }

    /// Required inputs applicable to `event`.
    pub fn inputs_for(&self, event: EventKind) -> impl Iterator<Item = &RequiredInput> {
        self.inputs.iter().filter(move |i| i.applies_to(event))
    }

    /// The process attribute path an external query field maps from.
    pub fn query_field(&self, process: &AttrPath) -> Option<&AttrPath> {
        self.query_fields
            .iter()
            .find(|(p, _)| p == process)
            .map(|(_, e)| e)
    }

    pub fn value_map(&self, path: &AttrPath) -> Option<&ValueMap> {
        self.value_maps.get(path)
    }

    /// Translate one attribute value process to external through the value
    /// map, when a table exists. A miss on an existing table is fatal; null
    /// passes through untranslated.
    pub fn external_value(&self, path: &AttrPath, value: &Value) -> Result<Value, DispatchError> {
        match self.value_map(path) {
            Some(map) if !map.is_empty() && !value.is_null() => {
                map.to_external(value)
                    .cloned()
                    .ok_or_else(|| DispatchError::ValueMappingMiss {
                        type_name: self.name.clone(),
                        path: path.clone(),
                        value: value.clone(),
                    })
            }
            _ => Ok(value.clone()),
        }
    }

    /// The inverse of [`external_value`](Self::external_value).
    pub fn process_value(&self, path: &AttrPath, value: &Value) -> Result<Value, DispatchError> {
        match self.value_map(path) {
            Some(map) if !map.is_empty() && !value.is_null() => {
                map.to_process(value)
                    .cloned()
                    .ok_or_else(|| DispatchError::ValueMappingMiss {
                        type_name: self.name.clone(),
                        path: path.clone(),
                        value: value.clone(),
                    })
            }
            _ => Ok(value.clone()),
        }
    }
}
