// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

mod controller;
mod prompt;

pub use controller::Controller;
pub use prompt::{PromptRequest, ScriptedPrompt, SetupPrompt};
