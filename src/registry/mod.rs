// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

mod descriptor;
#[allow(clippy::module_inception)]
mod registry;

pub use descriptor::{
    EventKind, Handler, HandlerSet, InputKind, InputOptions, QueryHandler, RequiredInput,
    TypeDescriptor, ValueMap,
};
pub use registry::TypeRegistry;
