// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

mod layer;
mod loader;
mod stack;

pub mod consts;

pub use layer::{Layer, LayerDescriptor};
pub use loader::{load_document, load_stack, save_document, LayerEntry, StackConfig};
pub use stack::{LayerScope, LayerStack};
