// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Navigation and merge helpers for JSON value trees.
//!
//! Configuration layers, attribute snapshots, and external-parameter views are
//! all nested `serde_json::Value` object trees addressed by [`AttrPath`]. These
//! helpers provide consistent traversal behavior across the system so that
//! every subsystem agrees on what a path means.

use crate::path::AttrPath;
use serde_json::Value;

/// Read the value at `path`, or `None` if any segment is absent or traverses
/// a non-object.
pub fn get_at<'a>(root: &'a Value, path: &AttrPath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// True when `path` resolves to a value in `root`.
pub fn exists_at(root: &Value, path: &AttrPath) -> bool {
    get_at(root, path).is_some()
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Returns `false` without modifying the tree when the path is empty or an
/// intermediate segment resolves to a non-object value.
pub fn set_at(root: &mut Value, path: &AttrPath, value: Value) -> bool {
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    if !root.is_object() {
        if root.is_null() {
            *root = Value::Object(serde_json::Map::new());
        } else {
            return false;
        }
    }

    let mut current = root;
    for segment in parents {
        let map = current.as_object_mut().expect("checked above");
        let entry = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !entry.is_object() {
            return false;
        }
        current = entry;
    }

    current
        .as_object_mut()
        .expect("checked above")
        .insert(last.clone(), value);
    true
}

/// Remove and return the value at `path`, leaving intermediate objects in
/// place. Returns `None` when the path does not resolve.
pub fn remove_at(root: &mut Value, path: &AttrPath) -> Option<Value> {
    let segments = path.segments();
    let (last, parents) = segments.split_last()?;

    let mut current = root;
    for segment in parents {
        current = current.as_object_mut()?.get_mut(segment)?;
    }

    current.as_object_mut()?.remove(last)
}

/// Merge `overlay` into `base`: object values merge recursively, everything
/// else in the overlay replaces the base value outright.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
