// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

mod bag;
mod wrapper;

pub use bag::{AddressMode, ParamBag};
pub use wrapper::{IterAction, ObjectList, ObjectWrapper};
