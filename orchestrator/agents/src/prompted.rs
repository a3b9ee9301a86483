// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Prompt-driven agent: one system prompt, one user prompt template, one chat call.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use collabpage_core::domain::agent::{AgentBehavior, CapabilityDescriptor, TransformError};
use collabpage_core::domain::llm::ChatCompletion;

/// Placeholder replaced by the transform input.
pub const INPUT_PLACEHOLDER: &str = "|||INPUT|||";

pub struct PromptedAgent {
    descriptor: CapabilityDescriptor,
    system_prompt: String,
    prompt_template: String,
    chat: Arc<dyn ChatCompletion>,
}

impl PromptedAgent {
    pub fn new(
        descriptor: CapabilityDescriptor,
        system_prompt: impl Into<String>,
        prompt_template: impl Into<String>,
        chat: Arc<dyn ChatCompletion>,
    ) -> Self {
        Self {
            descriptor,
            system_prompt: system_prompt.into(),
            prompt_template: prompt_template.into(),
            chat,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// The user prompt for `input`. The template itself is never modified.
    pub fn render_prompt(&self, input: &str) -> String {
        self.prompt_template.replace(INPUT_PLACEHOLDER, input)
    }
}

#[async_trait]
impl AgentBehavior for PromptedAgent {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn transform(&self, input: &str) -> Result<String, TransformError> {
        let prompt = self.render_prompt(input);
        debug!(agent = %self.descriptor.identity, prompt_len = prompt.len(), "Calling chat completion");
        let response = self.chat.complete(&self.system_prompt, &prompt).await?;
        Ok(response.trim().to_string())
    }
}
