// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! The addressable parameter bag.
//!
//! A bag carries the values passed into a handler invocation and caches
//! loaded wrappers by object-type name. At most one single wrapper and one
//! list wrapper are cached per type; list entries live under their own query
//! sub-namespace. A path whose first segment names a cached type is routed
//! into that wrapper; the addressing mode fixed at construction decides
//! whether routed reads and writes hit the attribute snapshot (process view)
//! or the raw external value (external view).
//!
//! `hdata` is the nested external-parameter view, populated only when the
//! dispatcher builds a controller-facing bag.

use crate::data::wrapper::{ObjectList, ObjectWrapper};
use crate::path::AttrPath;
use crate::utils::value_tree;
use serde_json::Value;
use std::collections::HashMap;

/// Which side of a cached wrapper a routed path addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    /// Reads and writes go through the attribute snapshot.
    #[default]
    Process,
    /// Reads and writes go through the raw external value.
    External,
}

#[derive(Debug, Clone, Default)]
pub struct ParamBag {
    mode: AddressMode,
    values: Value,
    objects: HashMap<String, ObjectWrapper>,
    queries: HashMap<String, ObjectList>,
    hdata: Value,
}

impl ParamBag {
    pub fn new(mode: AddressMode) -> Self {
        ParamBag {
            mode,
            values: Value::Object(serde_json::Map::new()),
            objects: HashMap::new(),
            queries: HashMap::new(),
            hdata: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn mode(&self) -> AddressMode {
        self.mode
    }

    /// Read a value; paths headed by a cached type name route into the
    /// wrapper, everything else hits the scalar store.
    pub fn get(&self, path: &AttrPath) -> Option<Value> {
        let head = path.head()?;
        if let Some(wrapper) = self.objects.get(head) {
            let tail = path.tail();
            return match self.mode {
                AddressMode::Process => {
                    if tail.is_empty() {
                        Some(wrapper.attrs().clone())
                    } else {
                        wrapper.get(&tail)
                    }
                }
                AddressMode::External => {
                    if tail.is_empty() {
                        Some(wrapper.external().clone())
                    } else {
                        value_tree::get_at(wrapper.external(), &tail).cloned()
                    }
                }
            };
        }
        value_tree::get_at(&self.values, path).cloned()
    }

    /// Write a value under the same routing rules as [`get`](Self::get).
    pub fn set(&mut self, path: &AttrPath, value: Value) -> bool {
        let Some(head) = path.head() else {
            return false;
        };
        if let Some(wrapper) = self.objects.get_mut(head) {
            let tail = path.tail();
            if tail.is_empty() {
                return false;
            }
            return match self.mode {
                AddressMode::Process => wrapper.set(&tail, value),
                AddressMode::External => {
                    wrapper.set(&AttrPath::atom("object").join(&tail), value)
                }
            };
        }
        value_tree::set_at(&mut self.values, path, value)
    }

    pub fn exists(&self, path: &AttrPath) -> bool {
        self.get(path).is_some()
    }

    /// Remove a scalar value. Cached wrappers are evicted with
    /// [`remove_object`](Self::remove_object), not through paths.
    pub fn del(&mut self, path: &AttrPath) -> Option<Value> {
        value_tree::remove_at(&mut self.values, path)
    }

    pub fn values(&self) -> &Value {
        &self.values
    }

    // single-object cache slots

    /// Cache a wrapper under its type name, evicting any previous entry.
    pub fn put_object(&mut self, mut wrapper: ObjectWrapper) {
        wrapper.register();
        if let Some(mut evicted) = self
            .objects
            .insert(wrapper.type_name().to_string(), wrapper)
        {
            evicted.unregister();
        }
    }

    pub fn object(&self, type_name: &str) -> Option<&ObjectWrapper> {
        self.objects.get(type_name)
    }

    pub fn object_mut(&mut self, type_name: &str) -> Option<&mut ObjectWrapper> {
        self.objects.get_mut(type_name)
    }

    pub fn has_object(&self, type_name: &str) -> bool {
        self.objects.contains_key(type_name)
    }

    pub fn remove_object(&mut self, type_name: &str) -> Option<ObjectWrapper> {
        let mut wrapper = self.objects.remove(type_name)?;
        wrapper.unregister();
        Some(wrapper)
    }

    // query-result cache slots (the `query` sub-namespace)

    pub fn put_query(&mut self, mut list: ObjectList) {
        list.register();
        if let Some(mut evicted) = self.queries.insert(list.type_name().to_string(), list) {
            evicted.unregister();
        }
    }

    pub fn query_result(&self, type_name: &str) -> Option<&ObjectList> {
        self.queries.get(type_name)
    }

    pub fn invalidate_query(&mut self, type_name: &str) -> bool {
        match self.queries.remove(type_name) {
            Some(mut list) => {
                list.unregister();
                true
            }
            None => false,
        }
    }

    // external-parameter view

    pub fn hdata(&self) -> &Value {
        &self.hdata
    }

    pub fn set_hdata(&mut self, path: &AttrPath, value: Value) -> bool {
        value_tree::set_at(&mut self.hdata, path, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DispatchError;
    use serde_json::json;

    fn wrapper_for(type_name: &str, external: Value) -> ObjectWrapper {
        let mut identity =
            |_: &str, ext: &Value| -> Result<Value, DispatchError> { Ok(ext.clone()) };
        ObjectWrapper::wrap(external, type_name, &mut identity).unwrap()
    }

    #[test]
    fn scalar_paths_hit_the_value_store() {
        let mut bag = ParamBag::new(AddressMode::Process);
        assert!(bag.set(&AttrPath::from("flavor/name"), json!("small")));
        assert_eq!(bag.get(&AttrPath::from("flavor/name")), Some(json!("small")));
        assert_eq!(bag.del(&AttrPath::from("flavor/name")), Some(json!("small")));
        assert!(!bag.exists(&AttrPath::from("flavor/name")));
    }

    #[test]
    fn typed_paths_route_into_the_wrapper() {
        let mut bag = ParamBag::new(AddressMode::Process);
        bag.put_object(wrapper_for("server", json!({ "Id": "ext-1" })));

        // process view reads the snapshot
        assert_eq!(bag.get(&AttrPath::from("server/Id")), Some(json!("ext-1")));
        assert!(bag.set(&AttrPath::from("server/Id"), json!("changed")));
        assert_eq!(
            bag.object("server").unwrap().attrs()["Id"],
            json!("changed")
        );
        // the raw external value is untouched in process mode
        assert_eq!(
            bag.object("server").unwrap().external()["Id"],
            json!("ext-1")
        );
    }

    #[test]
    fn external_mode_reads_the_raw_value() {
        let mut bag = ParamBag::new(AddressMode::External);
        bag.put_object(wrapper_for("server", json!({ "Id": "ext-1" })));

        assert_eq!(bag.get(&AttrPath::from("server/Id")), Some(json!("ext-1")));
        assert!(bag.set(&AttrPath::from("server/Id"), json!("ext-2")));
        assert_eq!(
            bag.object("server").unwrap().external()["Id"],
            json!("ext-2")
        );
    }

    #[test]
    fn one_single_slot_per_type() {
        let mut bag = ParamBag::new(AddressMode::Process);
        bag.put_object(wrapper_for("server", json!({ "Id": 1 })));
        bag.put_object(wrapper_for("server", json!({ "Id": 2 })));

        assert_eq!(bag.object("server").unwrap().external()["Id"], json!(2));
        assert!(bag.object("server").unwrap().is_registered());
    }

    #[test]
    fn remove_object_unregisters() {
        let mut bag = ParamBag::new(AddressMode::Process);
        bag.put_object(wrapper_for("server", json!({ "Id": 1 })));
        let removed = bag.remove_object("server").unwrap();
        assert!(!removed.is_registered());
        assert!(!bag.has_object("server"));
    }

    #[test]
    fn query_slots_live_in_their_own_namespace() {
        let mut bag = ParamBag::new(AddressMode::Process);
        let mut identity =
            |_: &str, ext: &Value| -> Result<Value, DispatchError> { Ok(ext.clone()) };
        let list = ObjectList::wrap_list(
            json!([{ "id": 1 }]),
            "server",
            json!({ "status": "active" }),
            &mut identity,
        )
        .unwrap();

        bag.put_query(list);
        bag.put_object(wrapper_for("server", json!({ "Id": 1 })));

        // both a single and a list entry coexist for the same type
        assert!(bag.has_object("server"));
        assert_eq!(bag.query_result("server").unwrap().len(), 1);

        assert!(bag.invalidate_query("server"));
        assert!(!bag.invalidate_query("server"));
        assert!(bag.has_object("server"));
    }

    #[test]
    fn hdata_is_a_separate_nested_view() {
        let mut bag = ParamBag::new(AddressMode::Process);
        assert!(bag.set_hdata(&AttrPath::from("Instance/Name"), json!("x")));
        assert_eq!(bag.hdata()["Instance"]["Name"], json!("x"));
        // not visible through ordinary addressing
        assert_eq!(bag.get(&AttrPath::from("Instance/Name")), None);
    }
}
