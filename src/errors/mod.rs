// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

mod controller;
mod declaration;
mod dispatch;

pub use controller::ControllerError;
pub use declaration::DeclarationError;
pub use dispatch::DispatchError;
