// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use collabpage_core::domain::agent::CapabilityDescriptor;
use collabpage_core::domain::llm::ChatCompletion;

use crate::prompted::PromptedAgent;

pub const NAME: &str = "SentimentDetectionAgent";
pub const PURPOSE: &str = "Detect sentiment in provided text";

const SYSTEM_PROMPT: &str = "You are an assistant which detects sentiment in provided Text.
You answer just with the sentiment you have detected.
You don't answer with a full sentence.";

const PROMPT: &str = "Detect the sentiment of: |||INPUT|||";

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::primary(NAME, PURPOSE)
}

/// Primary agent answering with a single sentiment word.
pub fn sentiment_detection_agent(chat: Arc<dyn ChatCompletion>) -> PromptedAgent {
    PromptedAgent::new(descriptor(), SYSTEM_PROMPT, PROMPT, chat)
}
