// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! The object-type registry.
//!
//! Application code declares each abstract object type once, in a declaration
//! phase: `declare_type` opens (or re-opens) a descriptor and makes it the
//! *current* type; the other declaration calls apply to the current type.
//! Re-declaring a type merges into the existing descriptor, so a process can
//! extend a type declared elsewhere without losing handler slots.
//!
//! Nested-object inputs may reference types that are declared later in the
//! same phase; [`TypeRegistry::validate`] performs the deferred check once all
//! declarations are in and accumulates every unresolved reference instead of
//! failing one at a time.

use crate::errors::DeclarationError;
use crate::path::AttrPath;
use crate::registry::descriptor::{
    EventKind, HandlerSet, InputKind, InputOptions, RequiredInput, TypeDescriptor, ValueMap,
};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
    current: Option<String>,
    optional_mode: bool,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an object type, or merge handlers into an existing declaration.
    ///
    /// Becomes the current type for subsequent declaration calls and resets
    /// the optional-inputs toggle.
    pub fn declare_type(&mut self, name: &str, handlers: HandlerSet) -> &mut Self {
        self.types
            .entry(name.to_string())
            .or_insert_with(|| TypeDescriptor::new(name))
            .handlers
            .merge(handlers);
        self.current = Some(name.to_string());
        self.optional_mode = false;
        self
    }

    /// All required inputs declared from here until the next `declare_type`
    /// default to optional.
    pub fn optional_from_here(&mut self) -> &mut Self {
        self.optional_mode = true;
        self
    }

    /// Add or update a required-input entry on the current type.
    ///
    /// An existing entry at the same path is replaced.
    pub fn require_input(
        &mut self,
        path: AttrPath,
        options: InputOptions,
    ) -> Result<&mut Self, DeclarationError> {
        if path.is_empty() {
            return Err(DeclarationError::MalformedPath {
                raw: path.to_string(),
            });
        }

        let required = options.required.unwrap_or(!self.optional_mode);
        let events = if options.events.is_empty() {
            EventKind::ALL.into_iter().collect()
        } else {
            options.events.iter().copied().collect()
        };

        let input = RequiredInput {
            path,
            kind: options.kind,
            required,
            events,
            default: options.default,
            extract_from: options.extract_from,
            external_name: options.external_name,
        };

        let descriptor = self.current_mut("require_input")?;
        descriptor.inputs.retain(|existing| existing.path != input.path);
        descriptor.inputs.push(input);
        Ok(self)
    }

    /// Map an external attribute path to a process attribute path on the
    /// current type's return-mapping.
    pub fn map_return(
        &mut self,
        external: AttrPath,
        process: AttrPath,
    ) -> Result<&mut Self, DeclarationError> {
        let descriptor = self.current_mut("map_return")?;
        descriptor.return_map.retain(|(e, _)| e != &external);
        descriptor.return_map.push((external, process));
        Ok(self)
    }

    /// Remove a return-mapping entry by its process path. Also clears the
    /// query-field mapping for that path.
    pub fn unmap_return(&mut self, process: &AttrPath) -> Result<&mut Self, DeclarationError> {
        let descriptor = self.current_mut("unmap_return")?;
        descriptor.return_map.retain(|(_, p)| p != process);
        descriptor.query_fields.retain(|(p, _)| p != process);
        Ok(self)
    }

    /// Declare one process-value <-> external-value pair for an attribute of
    /// the current type.
    pub fn map_value(
        &mut self,
        path: AttrPath,
        process_value: Value,
        external_value: Value,
    ) -> Result<&mut Self, DeclarationError> {
        let descriptor = self.current_mut("map_value")?;
        descriptor
            .value_maps
            .entry(path)
            .or_insert_with(ValueMap::default)
            .insert(process_value, external_value);
        Ok(self)
    }

    /// Map a process-level query field to its external field name.
    pub fn map_query_field(
        &mut self,
        process: AttrPath,
        external: AttrPath,
    ) -> Result<&mut Self, DeclarationError> {
        let descriptor = self.current_mut("map_query_field")?;
        descriptor.query_fields.retain(|(p, _)| p != &process);
        descriptor.query_fields.push((process, external));
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Deferred declaration check: every nested-object input must reference a
    /// declared type. Accumulates all failures so callers see every problem
    /// at once.
    pub fn validate(&self) -> Result<(), Vec<DeclarationError>> {
        let mut errors = Vec::new();

        for descriptor in self.types.values() {
            for input in &descriptor.inputs {
                if input.kind != InputKind::NestedObject {
                    continue;
                }
                match input.object_type() {
                    Some(nested) if self.types.contains_key(nested) => {}
                    Some(nested) => errors.push(DeclarationError::UnknownNestedType {
                        type_name: descriptor.name.clone(),
                        missing_type: nested.to_string(),
                    }),
                    None => errors.push(DeclarationError::MalformedPath {
                        raw: input.path.to_string(),
                    }),
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn current_mut(
        &mut self,
        call: &'static str,
    ) -> Result<&mut TypeDescriptor, DeclarationError> {
        let name = self
            .current
            .as_ref()
            .ok_or(DeclarationError::NoCurrentType { call })?;
        // current always names an entry created by declare_type
        Ok(self
            .types
            .get_mut(name)
            .expect("current type exists in registry"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::HandlerValue;
    use crate::registry::descriptor::Handler;
    use serde_json::json;
    use std::sync::Arc;

    fn noop() -> Handler {
        Arc::new(|_, _| Ok(HandlerValue::Nothing))
    }

    #[test]
    fn redeclaration_merges_disjoint_slots() {
        let mut registry = TypeRegistry::new();

        let mut first = HandlerSet::new();
        first.create = Some(noop());
        registry.declare_type("server", first);

        let mut second = HandlerSet::new();
        second.delete = Some(noop());
        registry.declare_type("server", second);

        let descriptor = registry.get("server").unwrap();
        assert!(descriptor.handlers.has(EventKind::Create));
        assert!(descriptor.handlers.has(EventKind::Delete));
    }

    #[test]
    fn declaration_outside_context_is_refused() {
        let mut registry = TypeRegistry::new();
        let err = registry
            .map_return(AttrPath::atom("Id"), AttrPath::atom("id"))
            .unwrap_err();
        assert_eq!(
            err,
            DeclarationError::NoCurrentType { call: "map_return" }
        );
    }

    #[test]
    fn optional_toggle_governs_following_inputs() {
        let mut registry = TypeRegistry::new();
        registry.declare_type("server", HandlerSet::new());

        registry
            .require_input(AttrPath::atom("image"), InputOptions::default())
            .unwrap();
        registry.optional_from_here();
        registry
            .require_input(AttrPath::atom("comment"), InputOptions::default())
            .unwrap();
        registry
            .require_input(
                AttrPath::atom("flavor"),
                InputOptions {
                    required: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let descriptor = registry.get("server").unwrap();
        let required: Vec<bool> = descriptor.inputs.iter().map(|i| i.required).collect();
        assert_eq!(required, vec![true, false, true]);

        // declare_type resets the toggle
        registry.declare_type("server", HandlerSet::new());
        registry
            .require_input(AttrPath::atom("zone"), InputOptions::default())
            .unwrap();
        assert!(registry.get("server").unwrap().inputs.last().unwrap().required);
    }

    #[test]
    fn require_input_replaces_entry_at_same_path() {
        let mut registry = TypeRegistry::new();
        registry.declare_type("server", HandlerSet::new());
        registry
            .require_input(
                AttrPath::atom("image"),
                InputOptions {
                    default: Some(json!("debian")),
                    ..Default::default()
                },
            )
            .unwrap();
        registry
            .require_input(
                AttrPath::atom("image"),
                InputOptions {
                    default: Some(json!("alpine")),
                    ..Default::default()
                },
            )
            .unwrap();

        let descriptor = registry.get("server").unwrap();
        assert_eq!(descriptor.inputs.len(), 1);
        assert_eq!(descriptor.inputs[0].default, Some(json!("alpine")));
    }

    #[test]
    fn unmap_return_clears_query_field_too() {
        let mut registry = TypeRegistry::new();
        registry.declare_type("server", HandlerSet::new());
        registry
            .map_return(AttrPath::atom("Name"), AttrPath::atom("name"))
            .unwrap();
        registry
            .map_query_field(AttrPath::atom("name"), AttrPath::atom("Name"))
            .unwrap();

        registry.unmap_return(&AttrPath::atom("name")).unwrap();

        let descriptor = registry.get("server").unwrap();
        assert!(descriptor.return_map.is_empty());
        assert!(descriptor.query_fields.is_empty());
    }

    #[test]
    fn validate_accepts_forward_references() {
        let mut registry = TypeRegistry::new();
        registry.declare_type("server", HandlerSet::new());
        registry
            .require_input(
                AttrPath::atom("connection"),
                InputOptions {
                    kind: InputKind::NestedObject,
                    ..Default::default()
                },
            )
            .unwrap();
        // "connection" declared after the reference
        registry.declare_type("connection", HandlerSet::new());

        assert!(registry.validate().is_ok());
    }

    #[test]
    fn validate_reports_unresolved_nested_types() {
        let mut registry = TypeRegistry::new();
        registry.declare_type("server", HandlerSet::new());
        registry
            .require_input(
                AttrPath::atom("connection"),
                InputOptions {
                    kind: InputKind::NestedObject,
                    ..Default::default()
                },
            )
            .unwrap();

        let errors = registry.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0],
            DeclarationError::UnknownNestedType {
                type_name: "server".to_string(),
                missing_type: "connection".to_string(),
            }
        );
    }
}
