// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! The resource-lifecycle dispatcher.
//!
//! Every lifecycle call runs the same state machine: check the type, look up
//! the handler, resolve missing nested dependencies by recursive create,
//! build a parameter bag from overrides, already-resolved values, and the
//! configuration stack, invoke the handler, map the raw result into an
//! attribute snapshot through the type's return-mapping, and maintain the
//! single-slot object and query caches.
//!
//! The dispatcher is strictly single-threaded and synchronous. A fatal error
//! unwinds the whole operation; dependency creations that succeeded before
//! the failure are deliberately left in place, never rolled back.

mod context;

pub use context::{HandlerCtx, HandlerValue};

use crate::config::{LayerScope, LayerStack};
use crate::data::{AddressMode, ObjectList, ObjectWrapper, ParamBag};
use crate::errors::{ControllerError, DispatchError};
use crate::observability::messages::dispatch::{
    DependencyAutoCreated, HandlerReturnedNothing, OptionalInputSkipped, QueryCacheHit,
    UpdateSkippedNoChanges,
};
use crate::observability::messages::StructuredLog;
use crate::path::AttrPath;
use crate::registry::{
    EventKind, Handler, InputKind, QueryHandler, TypeDescriptor, TypeRegistry,
};
use crate::traits::{Controller, SetupPrompt};
use crate::utils::value_tree;
use serde_json::Value;

pub struct Dispatcher {
    registry: TypeRegistry,
    config: LayerStack,
    controller: Box<dyn Controller>,
    data: ParamBag,
    prompt: Option<Box<dyn SetupPrompt>>,
    // types currently being created, for loop detection
    in_flight: Vec<String>,
}

impl Dispatcher {
    pub fn new(registry: TypeRegistry, config: LayerStack, controller: Box<dyn Controller>) -> Self {
        Dispatcher {
            registry,
            config,
            controller,
            data: ParamBag::new(AddressMode::Process),
            prompt: None,
            in_flight: Vec::new(),
        }
    }

    pub fn with_prompt(mut self, prompt: Box<dyn SetupPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Establish the backend connection using the configuration stack.
    pub fn connect(&mut self) -> Result<(), ControllerError> {
        self.controller.connect(&self.config)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &LayerStack {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut LayerStack {
        &mut self.config
    }

    /// The long-lived cache bag: single-object and query slots plus any
    /// values callers stash between operations.
    pub fn data(&self) -> &ParamBag {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ParamBag {
        &mut self.data
    }

    /// Create one object, auto-creating missing required dependencies first.
    ///
    /// A type with no create handler yields an empty "meta" wrapper that is
    /// cached like any other object. A handler that declines returns `None`.
    pub fn create(
        &mut self,
        type_name: &str,
        overrides: &Value,
    ) -> Result<Option<ObjectWrapper>, DispatchError> {
        let descriptor = self.descriptor(type_name)?;

        let Some(handler) = descriptor.handler(EventKind::Create) else {
            let wrapper = ObjectWrapper::empty(type_name);
            self.data.put_object(wrapper.clone());
            return Ok(Some(wrapper));
        };

        if self.in_flight.iter().any(|t| t == type_name) {
            return Err(DispatchError::DependencyLoop {
                type_name: type_name.to_string(),
                event: EventKind::Create,
                input: type_name.to_string(),
            });
        }

        self.in_flight.push(type_name.to_string());
        let result = self.run_create(&descriptor, &handler, overrides);
        self.in_flight.pop();
        result
    }

    /// Load one object into the cache. A type with no get handler is a
    /// silent no-op.
    pub fn get(
        &mut self,
        type_name: &str,
        overrides: &Value,
    ) -> Result<Option<ObjectWrapper>, DispatchError> {
        let descriptor = self.descriptor(type_name)?;
        let Some(handler) = descriptor.handler(EventKind::Get) else {
            return Ok(None);
        };

        self.resolve_dependencies(&descriptor, EventKind::Get)?;
        let mut bag = self.build_bag(&descriptor, EventKind::Get, overrides)?;

        match self.invoke(&descriptor, EventKind::Get, &handler, &mut bag)? {
            HandlerValue::Object(external) => {
                let wrapper = self.wrap_single(&descriptor, EventKind::Get, external)?;
                self.data.put_object(wrapper.clone());
                Ok(Some(wrapper))
            }
            HandlerValue::Nothing => {
                tracing::debug!(type_name, "get handler returned nothing");
                Ok(None)
            }
            other => Err(self.contract_violation(&descriptor, EventKind::Get, &other)),
        }
    }

    /// Run a query, answering from the cached result when the signature is
    /// structurally identical to the cached one.
    pub fn query(
        &mut self,
        type_name: &str,
        query: &Value,
        overrides: &Value,
    ) -> Result<Option<ObjectList>, DispatchError> {
        let descriptor = self.descriptor(type_name)?;
        let Some(handler) = descriptor.handlers.query.clone() else {
            return Ok(None);
        };

        if let Some(cached) = self.data.query_result(type_name) {
            if cached.query() == query {
                QueryCacheHit { type_name }.log();
                return Ok(Some(cached.clone()));
            }
        }

        self.resolve_dependencies(&descriptor, EventKind::Query)?;
        let mut bag = self.build_bag(&descriptor, EventKind::Query, overrides)?;

        match self.invoke_query(&descriptor, &handler, query, &mut bag)? {
            HandlerValue::List(collection) => {
                let list = self.wrap_list(&descriptor, collection, query.clone())?;
                self.data.put_query(list.clone());
                Ok(Some(list))
            }
            HandlerValue::Nothing => {
                HandlerReturnedNothing {
                    type_name,
                    event: "query",
                }
                .log();
                self.data.invalidate_query(type_name);
                Ok(None)
            }
            other => Err(self.contract_violation(&descriptor, EventKind::Query, &other)),
        }
    }

    /// Push changed attributes of the loaded object to the backend.
    ///
    /// The read-back diff runs first; when every declared attribute matches
    /// the snapshot, the handler is never invoked and the call reports
    /// "nothing changed". Returns whether anything was updated.
    pub fn update(&mut self, type_name: &str, overrides: &Value) -> Result<bool, DispatchError> {
        let descriptor = self.descriptor(type_name)?;
        let Some(handler) = descriptor.handler(EventKind::Update) else {
            return Ok(false);
        };
        if !self.data.has_object(type_name) {
            tracing::debug!(type_name, "update with no loaded object, nothing to do");
            return Ok(false);
        }

        let changed = self.changed_attrs(&descriptor)?;
        if changed.is_empty() {
            UpdateSkippedNoChanges { type_name }.log();
            return Ok(false);
        }

        self.resolve_dependencies(&descriptor, EventKind::Update)?;
        let mut bag = self.build_bag(&descriptor, EventKind::Update, overrides)?;
        // only the changed set crosses the boundary
        for (external_path, process_path, snapshot) in &changed {
            bag.set(&AttrPath::atom("changes").join(process_path), snapshot.clone());
            let external_value = descriptor.external_value(process_path, snapshot)?;
            bag.set_hdata(external_path, external_value);
        }

        match self.invoke(&descriptor, EventKind::Update, &handler, &mut bag)? {
            HandlerValue::Changed(applied) => {
                if applied {
                    self.absorb_update(&descriptor, &changed)?;
                    self.data.invalidate_query(type_name);
                }
                Ok(applied)
            }
            HandlerValue::Nothing => {
                tracing::debug!(type_name, "update handler returned nothing");
                Ok(false)
            }
            other => Err(self.contract_violation(&descriptor, EventKind::Update, &other)),
        }
    }

    /// Destroy the loaded object. Without a delete handler or a loaded
    /// object there is nothing to do.
    pub fn delete(&mut self, type_name: &str, overrides: &Value) -> Result<bool, DispatchError> {
        let descriptor = self.descriptor(type_name)?;
        let Some(handler) = descriptor.handler(EventKind::Delete) else {
            return Ok(false);
        };
        if !self.data.has_object(type_name) {
            tracing::debug!(type_name, "delete with no loaded object, nothing to do");
            return Ok(false);
        }

        self.resolve_dependencies(&descriptor, EventKind::Delete)?;
        let mut bag = self.build_bag(&descriptor, EventKind::Delete, overrides)?;

        match self.invoke(&descriptor, EventKind::Delete, &handler, &mut bag)? {
            HandlerValue::Changed(deleted) => {
                if deleted {
                    self.data.remove_object(type_name);
                    self.data.invalidate_query(type_name);
                }
                Ok(deleted)
            }
            HandlerValue::Nothing => Ok(false),
            other => Err(self.contract_violation(&descriptor, EventKind::Delete, &other)),
        }
    }

    /// Re-extract the loaded object's snapshot from its current external
    /// value. Returns whether the snapshot changed; with no loaded object
    /// there is nothing to refresh.
    pub fn refresh(&mut self, type_name: &str) -> Result<bool, DispatchError> {
        let descriptor = self.descriptor(type_name)?;
        let controller = self.controller.as_ref();
        let Some(wrapper) = self.data.object_mut(type_name) else {
            return Ok(false);
        };
        let mut extract = |_: &str, external: &Value| {
            extract_attrs(&descriptor, controller, EventKind::Get, external)
        };
        wrapper.refresh(&mut extract)
    }

    // the shared state-machine pieces

    fn descriptor(&self, type_name: &str) -> Result<TypeDescriptor, DispatchError> {
        self.registry
            .get(type_name)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownType {
                type_name: type_name.to_string(),
            })
    }

    fn run_create(
        &mut self,
        descriptor: &TypeDescriptor,
        handler: &Handler,
        overrides: &Value,
    ) -> Result<Option<ObjectWrapper>, DispatchError> {
        self.resolve_dependencies(descriptor, EventKind::Create)?;
        let mut bag = self.build_bag(descriptor, EventKind::Create, overrides)?;

        match self.invoke(descriptor, EventKind::Create, handler, &mut bag)? {
            HandlerValue::Object(external) => {
                let wrapper = self.wrap_single(descriptor, EventKind::Create, external)?;
                self.data.put_object(wrapper.clone());
                self.data.invalidate_query(&descriptor.name);
                Ok(Some(wrapper))
            }
            HandlerValue::Nothing => {
                HandlerReturnedNothing {
                    type_name: &descriptor.name,
                    event: "create",
                }
                .log();
                Ok(None)
            }
            other => Err(self.contract_violation(descriptor, EventKind::Create, &other)),
        }
    }

    /// Auto-create missing required nested dependencies. A dependency still
    /// missing after its create ran is a loop or a declined creation; either
    /// way resolution cannot make progress.
    fn resolve_dependencies(
        &mut self,
        descriptor: &TypeDescriptor,
        event: EventKind,
    ) -> Result<(), DispatchError> {
        let nested: Vec<(String, bool)> = descriptor
            .inputs_for(event)
            .filter(|input| input.kind == InputKind::NestedObject)
            .filter_map(|input| input.object_type().map(|t| (t.to_string(), input.required)))
            .collect();

        for (nested_type, required) in nested {
            if nested_type == descriptor.name || self.data.has_object(&nested_type) || !required {
                continue;
            }
            self.create(&nested_type, &Value::Null)?;
            if !self.data.has_object(&nested_type) {
                return Err(DispatchError::DependencyLoop {
                    type_name: descriptor.name.clone(),
                    event,
                    input: nested_type,
                });
            }
            DependencyAutoCreated {
                type_name: &descriptor.name,
                input: &nested_type,
            }
            .log();
        }
        Ok(())
    }

    /// Build the per-call parameter bag: a copy of the loaded self object and
    /// every resolved nested dependency, plus each data input pulled from the
    /// override, an extract-from source, or the configuration stack. Data
    /// inputs also land in the flattened external-parameter view, translated
    /// through the type's value maps.
    fn build_bag(
        &self,
        descriptor: &TypeDescriptor,
        event: EventKind,
        overrides: &Value,
    ) -> Result<ParamBag, DispatchError> {
        let mut bag = ParamBag::new(AddressMode::Process);

        if let Some(own) = self.data.object(&descriptor.name) {
            bag.put_object(ObjectWrapper::from(own));
        }

        for input in descriptor.inputs_for(event) {
            if input.kind != InputKind::NestedObject {
                continue;
            }
            let nested_type = input.object_type().unwrap_or_default();
            match self.data.object(nested_type) {
                Some(wrapper) => bag.put_object(ObjectWrapper::from(wrapper)),
                None if input.required && nested_type != descriptor.name => {
                    return Err(DispatchError::UnresolvedInput {
                        type_name: descriptor.name.clone(),
                        event,
                        input: nested_type.to_string(),
                    });
                }
                None => {
                    OptionalInputSkipped {
                        type_name: &descriptor.name,
                        input: nested_type,
                    }
                    .log();
                }
            }
        }

        for input in descriptor.inputs_for(event) {
            if input.kind != InputKind::Data {
                continue;
            }
            let mut value = value_tree::get_at(overrides, &input.path).cloned();
            if value.is_none() {
                if let Some(source) = &input.extract_from {
                    value = bag.get(source).or_else(|| self.data.get(source));
                }
            }
            if value.is_none() {
                value = self
                    .config
                    .get(&input.path, LayerScope::Any)
                    .or_else(|| input.default.clone());
            }

            match value {
                Some(value) => {
                    let external = descriptor.external_value(&input.path, &value)?;
                    let external_path = input.external_name.as_ref().unwrap_or(&input.path);
                    bag.set_hdata(external_path, external);
                    bag.set(&input.path, value);
                }
                None if input.required => {
                    return Err(DispatchError::UnresolvedInput {
                        type_name: descriptor.name.clone(),
                        event,
                        input: input.path.to_string(),
                    });
                }
                None => {
                    let input_path = input.path.to_string();
                    OptionalInputSkipped {
                        type_name: &descriptor.name,
                        input: &input_path,
                    }
                    .log();
                }
            }
        }

        Ok(bag)
    }

    fn invoke(
        &mut self,
        descriptor: &TypeDescriptor,
        event: EventKind,
        handler: &Handler,
        bag: &mut ParamBag,
    ) -> Result<HandlerValue, DispatchError> {
        let mut ctx = HandlerCtx::new(
            descriptor,
            event,
            &mut self.config,
            self.controller.as_mut(),
            self.prompt.as_mut().map(|p| p.as_mut() as &mut dyn SetupPrompt),
        );
        (handler.as_ref())(&mut ctx, bag)
    }

    fn invoke_query(
        &mut self,
        descriptor: &TypeDescriptor,
        handler: &QueryHandler,
        query: &Value,
        bag: &mut ParamBag,
    ) -> Result<HandlerValue, DispatchError> {
        let mut ctx = HandlerCtx::new(
            descriptor,
            EventKind::Query,
            &mut self.config,
            self.controller.as_mut(),
            self.prompt.as_mut().map(|p| p.as_mut() as &mut dyn SetupPrompt),
        );
        (handler.as_ref())(&mut ctx, query, bag)
    }

    fn wrap_single(
        &self,
        descriptor: &TypeDescriptor,
        event: EventKind,
        external: Value,
    ) -> Result<ObjectWrapper, DispatchError> {
        let controller = self.controller.as_ref();
        let mut extract =
            |_: &str, ext: &Value| extract_attrs(descriptor, controller, event, ext);
        ObjectWrapper::wrap(external, &descriptor.name, &mut extract)
    }

    fn wrap_list(
        &self,
        descriptor: &TypeDescriptor,
        collection: Value,
        query: Value,
    ) -> Result<ObjectList, DispatchError> {
        let controller = self.controller.as_ref();
        let mut extract =
            |_: &str, ext: &Value| extract_attrs(descriptor, controller, EventKind::Query, ext);
        ObjectList::wrap_list(collection, &descriptor.name, query, &mut extract)
    }

    /// The update read-back diff: compare every declared attribute's current
    /// external value against the in-memory snapshot. Returns the differing
    /// attributes as (external path, process path, snapshot value).
    fn changed_attrs(
        &self,
        descriptor: &TypeDescriptor,
    ) -> Result<Vec<(AttrPath, AttrPath, Value)>, DispatchError> {
        let wrapper = self
            .data
            .object(&descriptor.name)
            .expect("caller checked the cache slot");

        let mut changed = Vec::new();
        for (external_path, process_path) in &descriptor.return_map {
            let current = self
                .controller
                .get_attr(wrapper.external(), external_path)
                .map_err(|source| DispatchError::Controller {
                    type_name: descriptor.name.clone(),
                    event: EventKind::Update,
                    source,
                })?;
            let current = descriptor.process_value(process_path, &current)?;
            let snapshot = value_tree::get_at(wrapper.attrs(), process_path)
                .cloned()
                .unwrap_or(Value::Null);
            if current != snapshot {
                changed.push((external_path.clone(), process_path.clone(), snapshot));
            }
        }
        Ok(changed)
    }

    /// After a successful update, fold the pushed snapshot values back into
    /// the cached external value so the next diff starts clean.
    fn absorb_update(
        &mut self,
        descriptor: &TypeDescriptor,
        changed: &[(AttrPath, AttrPath, Value)],
    ) -> Result<(), DispatchError> {
        let Some(wrapper) = self.data.object_mut(&descriptor.name) else {
            return Ok(());
        };
        for (external_path, process_path, snapshot) in changed {
            let external_value = descriptor.external_value(process_path, snapshot)?;
            wrapper.set(&AttrPath::atom("object").join(external_path), external_value);
        }
        Ok(())
    }

    fn contract_violation(
        &self,
        descriptor: &TypeDescriptor,
        event: EventKind,
        got: &HandlerValue,
    ) -> DispatchError {
        DispatchError::ContractViolation {
            type_name: descriptor.name.clone(),
            event,
            got: got.kind(),
        }
    }
}

/// Produce an attribute snapshot from an external value by walking the
/// type's return-mapping: read each external attribute through the
/// controller, translate it through the value map, and place it at the
/// process path.
fn extract_attrs(
    descriptor: &TypeDescriptor,
    controller: &dyn Controller,
    event: EventKind,
    external: &Value,
) -> Result<Value, DispatchError> {
    let mut attrs = Value::Object(serde_json::Map::new());
    for (external_path, process_path) in &descriptor.return_map {
        let raw = controller
            .get_attr(external, external_path)
            .map_err(|source| DispatchError::Controller {
                type_name: descriptor.name.clone(),
                event,
                source,
            })?;
        let value = descriptor.process_value(process_path, &raw)?;
        value_tree::set_at(&mut attrs, process_path, value);
    }
    Ok(attrs)
}
