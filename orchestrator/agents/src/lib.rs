// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `collabpage-agents`: Built-in Agents
//!
//! The three agents of the default collaboration: two primary detectors that
//! act on raw input the contribution oracle approves, and a summarizer that
//! merges their outputs.
//!
//! | Agent | Role | Answers with |
//! |-------|------|--------------|
//! | [`language::NAME`] | Primary | the detected language |
//! | [`sentiment::NAME`] | Primary | the detected sentiment |
//! | [`summarizer::NAME`] | Derived | `{"language": .., "sentiment": ..}` |
//!
//! All three are [`PromptedAgent`]s sharing one chat completion provider.

pub mod language;
pub mod prompted;
pub mod sentiment;
pub mod summarizer;

use std::sync::Arc;

use collabpage_core::application::{CapabilityRegistry, RegistryError};
use collabpage_core::domain::agent::{AgentBehavior, CapabilityDescriptor};
use collabpage_core::domain::llm::ChatCompletion;

pub use language::language_detection_agent;
pub use prompted::PromptedAgent;
pub use sentiment::sentiment_detection_agent;
pub use summarizer::summarizer_agent;

/// Every built-in agent, in registration order.
pub fn builtin_agents(chat: Arc<dyn ChatCompletion>) -> Vec<Arc<dyn AgentBehavior>> {
    vec![
        Arc::new(language_detection_agent(chat.clone())),
        Arc::new(sentiment_detection_agent(chat.clone())),
        Arc::new(summarizer_agent(chat)),
    ]
}

/// Descriptors of the built-in agents, without a chat provider.
pub fn builtin_descriptors() -> Vec<CapabilityDescriptor> {
    vec![language::descriptor(), sentiment::descriptor(), summarizer::descriptor()]
}

/// Registry holding the built-in agents.
pub fn default_registry(chat: Arc<dyn ChatCompletion>) -> Result<CapabilityRegistry, RegistryError> {
    builtin_agents(chat)
        .into_iter()
        .fold(CapabilityRegistry::builder(), |builder, agent| builder.register(agent))
        .build()
}
