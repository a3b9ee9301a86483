// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Reactor identity, durable state and outcomes.
//!
//! # Invariants
//!
//! - A reactor never processes the same [`DedupKey`] twice.
//! - A reactor never consumes a file it produced itself.
//!
//! Both guards are append-only sets and are never rolled back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::agent::AgentIdentity;
use crate::domain::events::DedupKey;
use crate::domain::journal::InstanceId;

/// One reactor exists per agent kind and instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReactorKey {
    pub agent: AgentIdentity,
    pub instance_id: InstanceId,
}

impl ReactorKey {
    pub fn new(agent: AgentIdentity, instance_id: InstanceId) -> Self {
        Self { agent, instance_id }
    }
}

impl fmt::Display for ReactorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.agent, self.instance_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactorState {
    /// Events already acted upon.
    #[serde(default)]
    pub processed_input: BTreeSet<DedupKey>,
    /// Files this reactor wrote.
    #[serde(default)]
    pub provided_input: BTreeSet<String>,
}

impl ReactorState {
    pub fn has_processed(&self, key: &DedupKey) -> bool {
        self.processed_input.contains(key)
    }

    pub fn has_provided(&self, file_name: &str) -> bool {
        self.provided_input.contains(file_name)
    }

    pub fn mark_processed(&mut self, key: DedupKey) -> bool {
        self.processed_input.insert(key)
    }

    pub fn mark_provided(&mut self, file_name: impl Into<String>) -> bool {
        self.provided_input.insert(file_name.into())
    }
}

/// Why a reactor declined to act on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingEventId,
    NotCreated,
    AlreadyProcessed,
    SelfProduced,
    /// Primary reactor saw another agent's output.
    AgentCreatedInput,
    /// Derived reactor saw raw input.
    RawInput,
    /// The contribution oracle said no (or could not be asked).
    Declined,
    /// Derived reactor found no other agents' outputs to combine.
    NoInput,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::MissingEventId => "missing event id",
            SkipReason::NotCreated => "not a creation event",
            SkipReason::AlreadyProcessed => "already processed",
            SkipReason::SelfProduced => "self-produced artifact",
            SkipReason::AgentCreatedInput => "agent-created input",
            SkipReason::RawInput => "raw input",
            SkipReason::Declined => "declined by oracle",
            SkipReason::NoInput => "no input available",
        };
        f.write_str(text)
    }
}

/// Outcome of one handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    Produced { output_file: String },
    /// A derived reactor computed a result identical to one it already stored.
    Unchanged,
    Skipped(SkipReason),
}

impl Reaction {
    pub fn output_file(&self) -> Option<&str> {
        match self {
            Reaction::Produced { output_file } => Some(output_file),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_guards_are_set_semantics() {
        let mut state = ReactorState::default();
        let key = DedupKey {
            file_name: "a.txt".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        };

        assert!(state.mark_processed(key.clone()));
        assert!(!state.mark_processed(key.clone()));
        assert!(state.has_processed(&key));

        let later = DedupKey {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 1).unwrap(),
            ..key.clone()
        };
        assert!(!state.has_processed(&later));

        assert!(state.mark_provided("out.txt"));
        assert!(state.has_provided("out.txt"));
        assert!(!state.has_provided("a.txt"));
    }

    #[test]
    fn test_state_json_shape() {
        let mut state = ReactorState::default();
        state.mark_provided("out.txt");
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["provided_input"][0], "out.txt");

        let parsed: ReactorState = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, ReactorState::default());
    }
}
