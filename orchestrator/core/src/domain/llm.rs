// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Llm
//!
//! Chat completion seam used by agent transforms and the contribution oracle.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Isolates agents from vendor chat APIs

// Implementations live in infrastructure/llm/.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Domain interface for chat completion providers
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Complete a single system + user turn and return the assistant text
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, LLMError>;

    /// Check if provider is healthy and accessible
    async fn health_check(&self) -> Result<(), LLMError> {
        Ok(())
    }
}

/// Sampling options for chat completions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    #[serde(default)]
    pub temperature: f32,

    #[serde(default)]
    pub top_p: f32,

    #[serde(default = "default_penalty")]
    pub frequency_penalty: f32,

    #[serde(default = "default_penalty")]
    pub presence_penalty: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_penalty() -> f32 {
    0.7
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.0,
            frequency_penalty: default_penalty(),
            presence_penalty: default_penalty(),
            max_tokens: None,
        }
    }
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
