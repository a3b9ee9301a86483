// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Chat Completion Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the domain ChatCompletion seam and a vendor API.

pub mod openai;

use std::sync::Arc;

use crate::domain::config::LlmConfig;
use crate::domain::llm::ChatCompletion;

pub use openai::OpenAIChatAdapter;

/// Build the configured chat completion provider.
pub fn chat_completion_from_config(config: &LlmConfig) -> anyhow::Result<Arc<dyn ChatCompletion>> {
    let adapter = OpenAIChatAdapter::from_config(config)?;
    tracing::info!(
        provider = ?config.provider_type,
        endpoint = %config.endpoint,
        model = %config.model,
        "Configured chat completion provider"
    );
    Ok(Arc::new(adapter))
}
