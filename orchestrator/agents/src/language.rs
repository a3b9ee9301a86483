// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use collabpage_core::domain::agent::CapabilityDescriptor;
use collabpage_core::domain::llm::ChatCompletion;

use crate::prompted::PromptedAgent;

pub const NAME: &str = "LanguageDetectionAgent";
pub const PURPOSE: &str = "Detect language in provided text";

const SYSTEM_PROMPT: &str = "You are an assistant which detects language in provided Text.
You answer with the Language you have detected.";

const PROMPT: &str = "Detect the language of: |||INPUT|||";

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::primary(NAME, PURPOSE)
}

/// Primary agent naming the language of raw input.
pub fn language_detection_agent(chat: Arc<dyn ChatCompletion>) -> PromptedAgent {
    PromptedAgent::new(descriptor(), SYSTEM_PROMPT, PROMPT, chat)
}
