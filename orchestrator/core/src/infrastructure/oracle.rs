// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Contribution oracle backed by a chat completion model.
//!
//! The model is told the agent's capability and asked whether the task's
//! expected output calls for it. It answers `{"processing": true|false}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::domain::llm::ChatCompletion;
use crate::domain::oracle::{ContributionOracle, OracleError};

pub struct LlmContributionOracle {
    chat: Arc<dyn ChatCompletion>,
}

#[derive(Deserialize)]
struct OracleAnswer {
    processing: bool,
}

impl LlmContributionOracle {
    pub fn new(chat: Arc<dyn ChatCompletion>) -> Self {
        Self { chat }
    }

    fn system_prompt(agent_purpose: &str) -> String {
        format!(
            "You check if a specific task should be performed based on a given capability description. \
             The description of the capability is: {agent_purpose}. \
             You answer with \"true\" if the task should be processed and with \"false\" if not. \
             Also answer \"true\" if the task is only partially fulfilled by the capability. \
             Answer only with valid JSON in the form {{\"processing\": true}}."
        )
    }

    fn user_prompt(expected_processing_output: &str) -> String {
        format!("Should the task be performed on this expected output: {expected_processing_output}?")
    }
}

/// Parse the model's answer, tolerating code fences and surrounding prose.
pub fn parse_oracle_answer(answer: &str) -> Result<bool, OracleError> {
    let start = answer.find('{');
    let end = answer.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &answer[start..=end],
        _ => return Err(OracleError::InvalidResponse(answer.to_string())),
    };
    serde_json::from_str::<OracleAnswer>(json)
        .map(|parsed| parsed.processing)
        .map_err(|_| OracleError::InvalidResponse(answer.to_string()))
}

#[async_trait]
impl ContributionOracle for LlmContributionOracle {
    async fn should_contribute(
        &self,
        expected_processing_output: &str,
        agent_purpose: &str,
    ) -> Result<bool, OracleError> {
        let answer = self
            .chat
            .complete(
                &Self::system_prompt(agent_purpose),
                &Self::user_prompt(expected_processing_output),
            )
            .await?;
        debug!(agent_purpose, answer = %answer, "Contribution oracle answered");
        parse_oracle_answer(&answer)
    }
}
