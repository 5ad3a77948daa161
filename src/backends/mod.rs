// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Bundled controller implementations.
//!
//! [`MemoryController`] keeps everything in process memory and backs the
//! test suite; [`FileController`] persists each object type to a YAML
//! document under a root directory. Real deployments implement
//! [`Controller`](crate::traits::Controller) against their own backend.

mod file;
mod memory;

pub use file::FileController;
pub use memory::MemoryController;
