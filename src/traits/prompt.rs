// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Interactive setup prompts.
//!
//! Handlers that need operator input during setup go through this seam so
//! embedding applications decide how to ask. `None` means the operator
//! declined (or no answer was available); handlers treat a declined required
//! answer as a missing input.

use regex::Regex;
use std::collections::VecDeque;

/// One question for the operator.
pub struct PromptRequest<'a> {
    pub description: &'a str,
    pub default: Option<&'a str>,
    /// Anchored regular expression a valid answer must match.
    pub pattern: Option<&'a str>,
    /// Do not echo the answer (secrets).
    pub masked: bool,
    pub required: bool,
}

pub trait SetupPrompt {
    /// Ask one free-form question.
    fn ask(&mut self, request: &PromptRequest<'_>) -> Option<String>;

    /// Ask the operator to pick one of `values`.
    fn choose_from_list(&mut self, values: &[String], default: Option<&str>) -> Option<String>;
}

/// A prompt answering from a prepared script, for tests and unattended
/// setup runs.
///
/// Answers are consumed in order. An answer failing the request's pattern
/// falls back to the default; an exhausted script answers with the default.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompt {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(pattern: Option<&str>, answer: &str) -> bool {
        match pattern {
            Some(pattern) => match Regex::new(&format!("^(?:{pattern})$")) {
                Ok(re) => re.is_match(answer),
                // an unparsable pattern never matches
                Err(_) => false,
            },
            None => true,
        }
    }
}

impl SetupPrompt for ScriptedPrompt {
    fn ask(&mut self, request: &PromptRequest<'_>) -> Option<String> {
        if let Some(answer) = self.answers.pop_front() {
            if Self::matches(request.pattern, &answer) {
                return Some(answer);
            }
        }
        request.default.map(str::to_string)
    }

    fn choose_from_list(&mut self, values: &[String], default: Option<&str>) -> Option<String> {
        if let Some(answer) = self.answers.pop_front() {
            if values.iter().any(|v| v == &answer) {
                return Some(answer);
            }
        }
        default.map(str::to_string)
    }
}
