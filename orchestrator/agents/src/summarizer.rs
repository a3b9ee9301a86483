// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use collabpage_core::domain::agent::CapabilityDescriptor;
use collabpage_core::domain::llm::ChatCompletion;

use crate::prompted::PromptedAgent;

pub const NAME: &str = "SummarizerAgent";
pub const PURPOSE: &str = "Merge detected language and sentiment into one JSON object";

const SYSTEM_PROMPT: &str = r#"You are an assistant which takes two values as input.
You detect language and sentiment within the input.
You answer with a valid JSON object which includes language and sentiment.
The JSON object looks like this {"language":"en", "sentiment":"positive"}
If one of the needed values isn't provided you don't fill the JSON object with it.
You don't modify the provided language or sentiment. You just add them to the JSON object."#;

const PROMPT: &str = "Transform the input to a valid JSON object: |||INPUT|||";

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::derived(NAME, PURPOSE)
}

/// Derived agent combining every other agent's output for an instance.
pub fn summarizer_agent(chat: Arc<dyn ChatCompletion>) -> PromptedAgent {
    PromptedAgent::new(descriptor(), SYSTEM_PROMPT, PROMPT, chat)
}
