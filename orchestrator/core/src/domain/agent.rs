// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent identity and capability descriptors.
//!
//! A [`CapabilityDescriptor`] is the static record the registry keeps per
//! agent: who it is, what it is for, how it consumes input and which event
//! handler entry points it exposes. The agent's work itself sits behind
//! [`AgentBehavior`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::llm::LLMError;

/// Stable name of an agent kind (e.g. `"SummarizerAgent"`).
///
/// Written into `FileMetadata::agent_name` of every artifact the agent
/// produces, so it must not change between releases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentIdentity(String);

impl AgentIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AgentIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for AgentIdentity {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentIdentity {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// How a reactor sources its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactorRole {
    /// Consumes raw (human-submitted) input and asks the oracle before acting.
    Primary,
    /// Consumes the outputs of other agents; never consults the oracle.
    Derived,
}

/// Event handler entry point exposed by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// Reacts to a change on the collaboration page.
    PageEvent,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::PageEvent => "page_event",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static registration record for one agent kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    pub identity: AgentIdentity,
    /// Free-text capability description handed to the contribution oracle.
    pub purpose: String,
    pub role: ReactorRole,
    pub handlers: Vec<HandlerKind>,
}

impl CapabilityDescriptor {
    /// Primary agent exposing the page event handler.
    pub fn primary(identity: impl Into<AgentIdentity>, purpose: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            purpose: purpose.into(),
            role: ReactorRole::Primary,
            handlers: vec![HandlerKind::PageEvent],
        }
    }

    /// Derived agent exposing the page event handler.
    pub fn derived(identity: impl Into<AgentIdentity>, purpose: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            purpose: purpose.into(),
            role: ReactorRole::Derived,
            handlers: vec![HandlerKind::PageEvent],
        }
    }
}

/// Errors raised by an agent's transform.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LLMError),

    #[error("Transform failed: {0}")]
    Failed(String),
}

/// The pluggable part of an agent: its descriptor and its transform.
///
/// Eligibility, deduplication and persistence are handled by the reactor
/// pipeline; implementations only turn input text into a response.
#[async_trait]
pub trait AgentBehavior: Send + Sync {
    fn descriptor(&self) -> &CapabilityDescriptor;

    async fn transform(&self, input: &str) -> Result<String, TransformError>;
}
