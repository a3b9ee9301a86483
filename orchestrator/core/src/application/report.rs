// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Processing journal: the human-readable history of one instance.

use std::fmt;

use crate::application::journal::CollaborationJournal;
use crate::domain::journal::{InstanceId, JournalEntry};

#[derive(Debug, Clone)]
pub struct ProcessingJournal {
    pub instance_id: InstanceId,
    pub entries: Vec<JournalEntry>,
}

impl ProcessingJournal {
    /// Load every entry of the instance in creation order. Empty on failure.
    pub async fn load(journal: &CollaborationJournal, instance_id: &InstanceId) -> Self {
        Self {
            instance_id: instance_id.clone(),
            entries: journal.entries(instance_id).await,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Report lines, one block per entry.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().flat_map(entry_lines).collect()
    }
}

fn entry_lines(entry: &JournalEntry) -> Vec<String> {
    let metadata = &entry.metadata;
    let mut lines = vec![
        format!("File: {}", entry.file_name),
        format!("Agent Created: {}", metadata.is_agent_created),
    ];
    if metadata.is_agent_created {
        lines.push(format!("Agent: {}", metadata.agent_name));
        lines.push(format!("Input Files: {}", json_list(&metadata.input_files)));
        lines.push(format!(
            "Additional Output Files: {}",
            json_list(&metadata.additional_output_files)
        ));
    } else {
        lines.push(format!(
            "Expected Processing Output: {}",
            metadata.expected_processing_output
        ));
        lines.push(format!("Targeted Agents: {}", json_list(&metadata.targeted_agents)));
    }
    lines.push(format!("File Content: {}", entry.content));
    lines
}

fn json_list<T: serde::Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

impl fmt::Display for ProcessingJournal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for line in entry_lines(entry) {
                writeln!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}
