// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Uniform containers for external objects.
//!
//! An [`ObjectWrapper`] holds one raw external value together with the
//! attribute snapshot extracted from it; an [`ObjectList`] holds an external
//! collection, the query signature that produced it, and one wrapper per
//! element. The snapshot is produced exactly once when the wrapper is built
//! and is never recomputed implicitly; only an explicit refresh replaces it.
//!
//! Addressing rules: the `object` segment reaches the raw external value
//! (read-only on lists), an `attrs` prefix or a bare path reaches the
//! snapshot, and on lists an integer first segment indexes into the wrapped
//! elements.

use crate::errors::DispatchError;
use crate::path::AttrPath;
use crate::utils::value_tree;
use serde_json::Value;

const OBJECT_SEGMENT: &str = "object";
const ATTRS_SEGMENT: &str = "attrs";

/// Signal returned by `each`/`each_index` blocks on an [`ObjectList`].
///
/// Removals are applied after the traversal completes, never during it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterAction {
    Keep,
    Remove,
}

/// A single external object plus its extracted attribute snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectWrapper {
    type_name: String,
    external: Value,
    attrs: Value,
    registered: bool,
}

impl ObjectWrapper {
    /// Wrap an external value, invoking `extract` exactly once to produce the
    /// attribute snapshot.
    pub fn wrap<F>(external: Value, type_name: &str, extract: &mut F) -> Result<Self, DispatchError>
    where
        F: FnMut(&str, &Value) -> Result<Value, DispatchError>,
    {
        let attrs = extract(type_name, &external)?;
        Ok(ObjectWrapper {
            type_name: type_name.to_string(),
            external,
            attrs,
            registered: false,
        })
    }

    /// An empty "meta" wrapper for types with no create handler: no external
    /// value, no attributes.
    pub fn empty(type_name: &str) -> Self {
        ObjectWrapper {
            type_name: type_name.to_string(),
            external: Value::Null,
            attrs: Value::Object(serde_json::Map::new()),
            registered: false,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn external(&self) -> &Value {
        &self.external
    }

    pub fn attrs(&self) -> &Value {
        &self.attrs
    }

    /// 0 for an empty wrapper, 1 otherwise.
    pub fn len(&self) -> usize {
        if self.external.is_null() && self.attrs.as_object().map_or(true, |m| m.is_empty()) {
            0
        } else {
            1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a value by addressing rules. Returns `None` on a miss.
    pub fn get(&self, path: &AttrPath) -> Option<Value> {
        match path.head() {
            None => None,
            Some(OBJECT_SEGMENT) => {
                let tail = path.tail();
                if tail.is_empty() {
                    Some(self.external.clone())
                } else {
                    value_tree::get_at(&self.external, &tail).cloned()
                }
            }
            Some(ATTRS_SEGMENT) => value_tree::get_at(&self.attrs, &path.tail()).cloned(),
            Some(_) => value_tree::get_at(&self.attrs, path).cloned(),
        }
    }

    /// Write a value by addressing rules. Returns `false` on an addressing
    /// failure.
    pub fn set(&mut self, path: &AttrPath, value: Value) -> bool {
        match path.head() {
            None => false,
            Some(OBJECT_SEGMENT) => {
                let tail = path.tail();
                if tail.is_empty() {
                    self.external = value;
                    true
                } else {
                    value_tree::set_at(&mut self.external, &tail, value)
                }
            }
            Some(ATTRS_SEGMENT) => value_tree::set_at(&mut self.attrs, &path.tail(), value),
            Some(_) => value_tree::set_at(&mut self.attrs, path, value),
        }
    }

    pub fn exists(&self, path: &AttrPath) -> bool {
        self.get(path).is_some()
    }

    /// Explicitly replace the snapshot by re-running extraction against the
    /// current external value. Returns whether anything changed.
    pub fn refresh<F>(&mut self, extract: &mut F) -> Result<bool, DispatchError>
    where
        F: FnMut(&str, &Value) -> Result<Value, DispatchError>,
    {
        let attrs = extract(&self.type_name, &self.external)?;
        let changed = attrs != self.attrs;
        self.attrs = attrs;
        Ok(changed)
    }

    // Registration is pure bookkeeping for the parameter-bag cache; the
    // wrapper makes no ownership decisions from it.

    pub fn register(&mut self) {
        self.registered = true;
    }

    pub fn unregister(&mut self) {
        self.registered = false;
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }
}

impl From<&ObjectWrapper> for ObjectWrapper {
    /// Copy semantics: attrs and external are copied, not re-extracted.
    fn from(other: &ObjectWrapper) -> Self {
        ObjectWrapper {
            type_name: other.type_name.clone(),
            external: other.external.clone(),
            attrs: other.attrs.clone(),
            registered: false,
        }
    }
}

/// An external collection wrapped element by element.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectList {
    type_name: String,
    external: Value,
    query: Value,
    items: Vec<ObjectWrapper>,
    registered: bool,
}

impl ObjectList {
    /// Wrap each element of an external collection with the same extractor.
    ///
    /// Null entries are skipped. Extraction failure on any element aborts the
    /// whole call with a mapping error naming the type.
    pub fn wrap_list<F>(
        external: Value,
        type_name: &str,
        query: Value,
        extract: &mut F,
    ) -> Result<Self, DispatchError>
    where
        F: FnMut(&str, &Value) -> Result<Value, DispatchError>,
    {
        let elements = external
            .as_array()
            .ok_or_else(|| DispatchError::MappingFailed {
                type_name: type_name.to_string(),
                reason: "query result is not a collection".to_string(),
            })?;

        let mut items = Vec::with_capacity(elements.len());
        for element in elements {
            if element.is_null() {
                continue;
            }
            let wrapper = ObjectWrapper::wrap(element.clone(), type_name, extract).map_err(
                |err| DispatchError::MappingFailed {
                    type_name: type_name.to_string(),
                    reason: format!("element extraction failed: {}", err),
                },
            )?;
            items.push(wrapper);
        }

        Ok(ObjectList {
            type_name: type_name.to_string(),
            external,
            query,
            items,
            registered: false,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn query(&self) -> &Value {
        &self.query
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ObjectWrapper] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&ObjectWrapper> {
        self.items.get(index)
    }

    pub fn item_mut(&mut self, index: usize) -> Option<&mut ObjectWrapper> {
        self.items.get_mut(index)
    }

    /// Read by addressing rules: `object` reaches the raw collection, an
    /// integer first segment indexes an element, remaining segments address
    /// that element's attrs.
    pub fn get(&self, path: &AttrPath) -> Option<Value> {
        match path.head() {
            None => None,
            Some(OBJECT_SEGMENT) => Some(self.external.clone()),
            Some(segment) => {
                let index: usize = segment.parse().ok()?;
                let item = self.items.get(index)?;
                let tail = path.tail();
                if tail.is_empty() {
                    Some(item.attrs().clone())
                } else {
                    item.get(&tail)
                }
            }
        }
    }

    /// Write into an element's attrs. The raw collection is read-only.
    pub fn set(&mut self, path: &AttrPath, value: Value) -> bool {
        match path.head() {
            None | Some(OBJECT_SEGMENT) => false,
            Some(segment) => {
                let Ok(index) = segment.parse::<usize>() else {
                    return false;
                };
                let tail = path.tail();
                if tail.is_empty() {
                    return false;
                }
                match self.items.get_mut(index) {
                    Some(item) => item.set(&tail, value),
                    None => false,
                }
            }
        }
    }

    pub fn exists(&self, path: &AttrPath) -> bool {
        self.get(path).is_some()
    }

    /// Visit every element; elements for which the block signals
    /// [`IterAction::Remove`] are deleted after the traversal completes.
    /// Returns the number of removed elements.
    pub fn each<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(&ObjectWrapper) -> IterAction,
    {
        let doomed: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| f(item) == IterAction::Remove)
            .map(|(i, _)| i)
            .collect();
        for index in doomed.iter().rev() {
            self.items.remove(*index);
        }
        doomed.len()
    }

    /// As [`each`](Self::each), but the block sees element indexes.
    pub fn each_index<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(usize) -> IterAction,
    {
        let doomed: Vec<usize> = (0..self.items.len())
            .filter(|i| f(*i) == IterAction::Remove)
            .collect();
        for index in doomed.iter().rev() {
            self.items.remove(*index);
        }
        doomed.len()
    }

    pub fn register(&mut self) {
        self.registered = true;
    }

    pub fn unregister(&mut self) {
        self.registered = false;
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity_extract(_: &str, external: &Value) -> Result<Value, DispatchError> {
        Ok(external.clone())
    }

    #[test]
    fn wrap_invokes_extractor_exactly_once() {
        let mut calls = 0;
        let wrapper = ObjectWrapper::wrap(json!({ "Id": 7 }), "server", &mut |_, ext| {
            calls += 1;
            Ok(json!({ "id": ext["Id"] }))
        })
        .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(wrapper.attrs(), &json!({ "id": 7 }));
        // reading attributes never re-extracts
        assert_eq!(wrapper.get(&AttrPath::from("id")), Some(json!(7)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn copy_semantics_skip_extraction() {
        let mut original =
            ObjectWrapper::wrap(json!({ "a": 1 }), "server", &mut identity_extract).unwrap();
        original.register();

        let copy = ObjectWrapper::from(&original);
        assert_eq!(copy.external(), original.external());
        assert_eq!(copy.attrs(), original.attrs());
        assert!(!copy.is_registered());
    }

    #[test]
    fn addressing_object_and_attrs() {
        let wrapper = ObjectWrapper::wrap(
            json!({ "Raw": { "Deep": true } }),
            "server",
            &mut |_, _| Ok(json!({ "name": "x" })),
        )
        .unwrap();

        assert_eq!(
            wrapper.get(&AttrPath::from("object")),
            Some(json!({ "Raw": { "Deep": true } }))
        );
        assert_eq!(
            wrapper.get(&AttrPath::from("object/Raw/Deep")),
            Some(json!(true))
        );
        assert_eq!(wrapper.get(&AttrPath::from("attrs/name")), Some(json!("x")));
        assert_eq!(wrapper.get(&AttrPath::from("name")), Some(json!("x")));
        assert_eq!(wrapper.get(&AttrPath::from("missing")), None);
    }

    #[test]
    fn set_reaches_snapshot_not_external() {
        let mut wrapper =
            ObjectWrapper::wrap(json!({ "a": 1 }), "server", &mut identity_extract).unwrap();
        assert!(wrapper.set(&AttrPath::from("a"), json!(2)));
        assert_eq!(wrapper.attrs()["a"], json!(2));
        assert_eq!(wrapper.external()["a"], json!(1));
    }

    #[test]
    fn empty_wrapper_has_length_zero() {
        let wrapper = ObjectWrapper::empty("meta");
        assert_eq!(wrapper.len(), 0);
        let full =
            ObjectWrapper::wrap(json!({ "a": 1 }), "server", &mut identity_extract).unwrap();
        assert_eq!(full.len(), 1);
    }

    #[test]
    fn refresh_reports_changes() {
        let mut wrapper =
            ObjectWrapper::wrap(json!({ "a": 1 }), "server", &mut identity_extract).unwrap();
        assert!(!wrapper.refresh(&mut identity_extract).unwrap());

        wrapper.set(&AttrPath::from("object/a"), json!(5));
        assert!(wrapper.refresh(&mut identity_extract).unwrap());
        assert_eq!(wrapper.attrs()["a"], json!(5));
    }

    #[test]
    fn wrap_list_skips_null_entries() {
        let list = ObjectList::wrap_list(
            json!([{ "id": 1 }, null, { "id": 2 }]),
            "server",
            json!({}),
            &mut identity_extract,
        )
        .unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn wrap_list_aborts_on_element_failure() {
        let err = ObjectList::wrap_list(
            json!([{ "id": 1 }, { "id": 2 }]),
            "server",
            json!({}),
            &mut |type_name, ext| {
                if ext["id"] == json!(2) {
                    Err(DispatchError::MappingFailed {
                        type_name: type_name.to_string(),
                        reason: "boom".to_string(),
                    })
                } else {
                    Ok(ext.clone())
                }
            },
        )
        .unwrap_err();

        match err {
            DispatchError::MappingFailed { type_name, .. } => assert_eq!(type_name, "server"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn list_indexing_addresses_elements() {
        let list = ObjectList::wrap_list(
            json!([{ "id": 1 }, { "id": 2 }]),
            "server",
            json!({}),
            &mut identity_extract,
        )
        .unwrap();

        assert_eq!(list.get(&AttrPath::from("1/id")), Some(json!(2)));
        assert_eq!(list.get(&AttrPath::from("0")), Some(json!({ "id": 1 })));
        assert_eq!(list.get(&AttrPath::from("9/id")), None);
        assert_eq!(
            list.get(&AttrPath::from("object")),
            Some(json!([{ "id": 1 }, { "id": 2 }]))
        );
    }

    #[test]
    fn list_raw_collection_is_read_only() {
        let mut list = ObjectList::wrap_list(
            json!([{ "id": 1 }]),
            "server",
            json!({}),
            &mut identity_extract,
        )
        .unwrap();
        assert!(!list.set(&AttrPath::from("object"), json!([])));
        assert!(list.set(&AttrPath::from("0/id"), json!(9)));
        assert_eq!(list.get(&AttrPath::from("0/id")), Some(json!(9)));
    }

    #[test]
    fn each_removes_after_traversal() {
        let mut list = ObjectList::wrap_list(
            json!([{ "id": 1 }, { "id": 2 }, { "id": 3 }]),
            "server",
            json!({}),
            &mut identity_extract,
        )
        .unwrap();

        // remove even ids; indexes observed during traversal are stable
        let mut seen = Vec::new();
        let removed = list.each(|item| {
            seen.push(item.attrs()["id"].clone());
            if item.attrs()["id"].as_i64().unwrap() % 2 == 0 {
                IterAction::Remove
            } else {
                IterAction::Keep
            }
        });

        assert_eq!(removed, 1);
        assert_eq!(seen, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(&AttrPath::from("1/id")), Some(json!(3)));
    }
}
