// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

pub mod backends;      // controller implementations
pub mod config;        // layered configuration stack
pub mod data;          // object wrappers + parameter bags
pub mod dispatch;      // resource-lifecycle dispatcher
pub mod errors;        // error handling
pub mod observability;
pub mod path;          // addressable attribute paths
pub mod registry;      // object-type registry
pub mod traits;        // external plugin contracts
pub mod utils;
