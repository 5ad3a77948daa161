// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! The execution context handed to process handlers.
//!
//! A handler never touches the dispatcher directly; it receives a
//! [`HandlerCtx`] scoped to the current type and event. The context carries
//! the configuration stack, thin forwarding methods onto the backend
//! controller, the declarative translation helpers of the current type, and
//! the optional setup prompt.

use crate::config::LayerStack;
use crate::errors::{ControllerError, DispatchError};
use crate::path::AttrPath;
use crate::registry::{EventKind, TypeDescriptor};
use crate::traits::{Controller, SetupPrompt};
use crate::utils::value_tree;
use serde_json::Value;

/// What a process handler hands back to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerValue {
    /// One external object (create/get).
    Object(Value),
    /// An external collection (query).
    List(Value),
    /// Success indicator (update/delete).
    Changed(bool),
    /// The handler declined to act.
    Nothing,
}

impl HandlerValue {
    /// Value-kind label for contract-violation errors.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerValue::Object(_) => "object",
            HandlerValue::List(_) => "list",
            HandlerValue::Changed(_) => "boolean",
            HandlerValue::Nothing => "nothing",
        }
    }
}

pub struct HandlerCtx<'a> {
    descriptor: &'a TypeDescriptor,
    event: EventKind,
    config: &'a mut LayerStack,
    controller: &'a mut dyn Controller,
    prompt: Option<&'a mut dyn SetupPrompt>,
}

impl<'a> HandlerCtx<'a> {
    pub(crate) fn new(
        descriptor: &'a TypeDescriptor,
        event: EventKind,
        config: &'a mut LayerStack,
        controller: &'a mut dyn Controller,
        prompt: Option<&'a mut dyn SetupPrompt>,
    ) -> Self {
        HandlerCtx {
            descriptor,
            event,
            config,
            controller,
            prompt,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn event(&self) -> EventKind {
        self.event
    }

    pub fn config(&self) -> &LayerStack {
        self.config
    }

    /// Handlers may write configuration during their own execution.
    pub fn config_mut(&mut self) -> &mut LayerStack {
        self.config
    }

    /// The setup prompt, when the embedding application installed one.
    pub fn prompt(&mut self) -> Option<&mut dyn SetupPrompt> {
        self.prompt.as_mut().map(|p| &mut **p as &mut dyn SetupPrompt)
    }

    // controller forwarding

    pub fn controller_create(&mut self, params: &Value) -> Result<Value, DispatchError> {
        let type_name = self.descriptor.name.clone();
        self.controller
            .create(&type_name, params)
            .map_err(|err| self.controller_err(err))
    }

    pub fn controller_get(&mut self, id: &str) -> Result<Value, DispatchError> {
        let type_name = self.descriptor.name.clone();
        self.controller
            .get(&type_name, id)
            .map_err(|err| self.controller_err(err))
    }

    pub fn controller_query(&mut self, filter: &Value) -> Result<Value, DispatchError> {
        let type_name = self.descriptor.name.clone();
        self.controller
            .query(&type_name, filter)
            .map_err(|err| self.controller_err(err))
    }

    pub fn controller_update(&mut self, id: &str, params: &Value) -> Result<Value, DispatchError> {
        let type_name = self.descriptor.name.clone();
        self.controller
            .update(&type_name, id, params)
            .map_err(|err| self.controller_err(err))
    }

    pub fn controller_delete(&mut self, id: &str) -> Result<(), DispatchError> {
        let type_name = self.descriptor.name.clone();
        self.controller
            .delete(&type_name, id)
            .map_err(|err| self.controller_err(err))
    }

    pub fn get_attr(&self, external: &Value, path: &AttrPath) -> Result<Value, DispatchError> {
        self.controller
            .get_attr(external, path)
            .map_err(|err| self.controller_err(err))
    }

    pub fn set_attr(
        &mut self,
        external: &mut Value,
        path: &AttrPath,
        value: Value,
    ) -> Result<(), DispatchError> {
        self.controller
            .set_attr(external, path, value)
            .map_err(|err| self.controller_err(err))
    }

    // declarative translation helpers

    /// Translate a process-level query signature into an external filter
    /// using the type's query-field and value mappings.
    pub fn external_filter(&self, query: &Value) -> Result<Value, DispatchError> {
        let Some(fields) = query.as_object() else {
            return Ok(query.clone());
        };

        let mut filter = Value::Object(serde_json::Map::new());
        for (field, value) in fields {
            let process = AttrPath::from(field.as_str());
            let external = self
                .descriptor
                .query_field(&process)
                .cloned()
                .unwrap_or_else(|| process.clone());
            let translated = self.to_external_value(&process, value)?;
            value_tree::set_at(&mut filter, &external, translated);
        }
        Ok(filter)
    }

    /// Apply the value-mapping table for one attribute, process to external.
    /// A miss on an existing table is fatal.
    pub fn to_external_value(
        &self,
        path: &AttrPath,
        value: &Value,
    ) -> Result<Value, DispatchError> {
        self.descriptor.external_value(path, value)
    }

    /// Apply the value-mapping table for one attribute, external to process.
    pub fn to_process_value(
        &self,
        path: &AttrPath,
        value: &Value,
    ) -> Result<Value, DispatchError> {
        self.descriptor.process_value(path, value)
    }

    fn controller_err(&self, source: ControllerError) -> DispatchError {
        DispatchError::Controller {
            type_name: self.descriptor.name.clone(),
            event: self.event,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{HandlerSet, TypeRegistry};
    use serde_json::json;

    struct Bare;
    impl Controller for Bare {}

    fn descriptor_with_mappings() -> TypeDescriptor {
        let mut registry = TypeRegistry::new();
        registry.declare_type("server", HandlerSet::new());
        registry
            .map_query_field(AttrPath::atom("status"), AttrPath::atom("PowerState"))
            .unwrap();
        registry
            .map_value(AttrPath::atom("status"), json!("running"), json!(16))
            .unwrap();
        registry
            .map_value(AttrPath::atom("status"), json!("stopped"), json!(80))
            .unwrap();
        registry.get("server").unwrap().clone()
    }

    #[test]
    fn external_filter_renames_and_translates() {
        let descriptor = descriptor_with_mappings();
        let mut config = LayerStack::standard();
        let mut controller = Bare;
        let ctx = HandlerCtx::new(
            &descriptor,
            EventKind::Query,
            &mut config,
            &mut controller,
            None,
        );

        let filter = ctx
            .external_filter(&json!({ "status": "running", "name": "web" }))
            .unwrap();
        assert_eq!(filter, json!({ "PowerState": 16, "name": "web" }));
    }

    #[test]
    fn value_mapping_miss_is_fatal() {
        let descriptor = descriptor_with_mappings();
        let mut config = LayerStack::standard();
        let mut controller = Bare;
        let ctx = HandlerCtx::new(
            &descriptor,
            EventKind::Query,
            &mut config,
            &mut controller,
            None,
        );

        let err = ctx
            .external_filter(&json!({ "status": "paused" }))
            .unwrap_err();
        assert!(matches!(err, DispatchError::ValueMappingMiss { .. }));
    }

    #[test]
    fn unimplemented_controller_call_carries_context() {
        let descriptor = descriptor_with_mappings();
        let mut config = LayerStack::standard();
        let mut controller = Bare;
        let mut ctx = HandlerCtx::new(
            &descriptor,
            EventKind::Create,
            &mut config,
            &mut controller,
            None,
        );

        let err = ctx.controller_create(&json!({})).unwrap_err();
        match err {
            DispatchError::Controller {
                type_name, event, ..
            } => {
                assert_eq!(type_name, "server");
                assert_eq!(event, EventKind::Create);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
