// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Contribution oracle seam: "should this agent act on this task?"

use async_trait::async_trait;

use crate::domain::llm::LLMError;

#[async_trait]
pub trait ContributionOracle: Send + Sync {
    /// Decide whether an agent with `agent_purpose` should contribute to a
    /// task described by `expected_processing_output`.
    async fn should_contribute(
        &self,
        expected_processing_output: &str,
        agent_purpose: &str,
    ) -> Result<bool, OracleError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle LLM call failed: {0}")]
    Llm(#[from] LLMError),

    #[error("Oracle returned an unusable answer: {0}")]
    InvalidResponse(String),
}
