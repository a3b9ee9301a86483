// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Collaboration journal value types.
//!
//! Every artifact lives under `{instance_id}/{file_name}` and carries a
//! [`FileMetadata`] record describing its provenance. On the blob backend the
//! record is flattened into a string map, one key per field, each value JSON
//! encoded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::domain::agent::AgentIdentity;
use crate::domain::storage::BlobMetadata;

/// Opaque identifier of a collaboration session.
///
/// An instance has no record of its own: it is the first path segment of
/// every journal entry that belongs to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random instance id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InstanceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Storage path of a journal entry.
pub fn journal_path(instance_id: &InstanceId, file_name: &str) -> String {
    format!("{}/{}", instance_id, file_name)
}

/// Inverse of [`journal_path`]. Returns `None` for paths outside any instance.
pub fn split_journal_path(path: &str) -> Option<(InstanceId, &str)> {
    let (instance, file_name) = path.split_once('/')?;
    if instance.is_empty() || file_name.is_empty() {
        return None;
    }
    Some((InstanceId::new(instance), file_name))
}

const KEY_AGENT_NAME: &str = "AgentName";
const KEY_IS_AGENT_CREATED: &str = "IsAgentCreated";
const KEY_INPUT_FILES: &str = "InputFiles";
const KEY_ADDITIONAL_OUTPUT_FILES: &str = "AdditionalOutputFiles";
const KEY_EXPECTED_PROCESSING_OUTPUT: &str = "ExpectedProcessingOutput";
const KEY_TARGETED_AGENTS: &str = "TargetedAgents";

/// Provenance record attached to every journal entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Producing agent; empty for raw input.
    pub agent_name: String,
    pub is_agent_created: bool,
    /// Entries the producing agent consumed, in order.
    pub input_files: Vec<String>,
    pub additional_output_files: Vec<String>,
    /// Free-text task description supplied with raw input.
    pub expected_processing_output: String,
    pub targeted_agents: Vec<AgentIdentity>,
}

impl FileMetadata {
    /// Metadata for human-submitted input.
    pub fn raw_input(expected_processing_output: impl Into<String>) -> Self {
        Self {
            expected_processing_output: expected_processing_output.into(),
            ..Default::default()
        }
    }

    /// Metadata for an artifact produced by `agent` from `input_files`.
    pub fn agent_output(agent: &AgentIdentity, input_files: Vec<String>) -> Self {
        Self {
            agent_name: agent.to_string(),
            is_agent_created: true,
            input_files,
            ..Default::default()
        }
    }

    /// Flatten into the blob metadata map.
    pub fn to_blob_metadata(&self) -> BlobMetadata {
        let mut map = BlobMetadata::new();
        map.insert(KEY_AGENT_NAME.to_string(), encode(&self.agent_name));
        map.insert(KEY_IS_AGENT_CREATED.to_string(), encode(&self.is_agent_created));
        map.insert(KEY_INPUT_FILES.to_string(), encode(&self.input_files));
        map.insert(
            KEY_ADDITIONAL_OUTPUT_FILES.to_string(),
            encode(&self.additional_output_files),
        );
        map.insert(
            KEY_EXPECTED_PROCESSING_OUTPUT.to_string(),
            encode(&self.expected_processing_output),
        );
        map.insert(KEY_TARGETED_AGENTS.to_string(), encode(&self.targeted_agents));
        map
    }

    /// Rebuild from the blob metadata map, field by field.
    ///
    /// Missing keys and values that fail to decode keep their default.
    /// Keys are matched case-insensitively since some backends lowercase them.
    pub fn from_blob_metadata(map: &BlobMetadata) -> Self {
        let mut metadata = Self::default();
        if let Some(v) = decode(map, KEY_AGENT_NAME) {
            metadata.agent_name = v;
        }
        if let Some(v) = decode(map, KEY_IS_AGENT_CREATED) {
            metadata.is_agent_created = v;
        }
        if let Some(v) = decode(map, KEY_INPUT_FILES) {
            metadata.input_files = v;
        }
        if let Some(v) = decode(map, KEY_ADDITIONAL_OUTPUT_FILES) {
            metadata.additional_output_files = v;
        }
        if let Some(v) = decode(map, KEY_EXPECTED_PROCESSING_OUTPUT) {
            metadata.expected_processing_output = v;
        }
        if let Some(v) = decode(map, KEY_TARGETED_AGENTS) {
            metadata.targeted_agents = v;
        }
        metadata
    }
}

fn encode<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn decode<T: serde::de::DeserializeOwned>(map: &BlobMetadata, key: &str) -> Option<T> {
    let raw = map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(key, error = %e, "Ignoring undecodable metadata value");
            None
        }
    }
}

/// A journal entry with its content and provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub instance_id: InstanceId,
    pub file_name: String,
    pub content: String,
    pub metadata: FileMetadata,
    pub created_at: DateTime<Utc>,
}

pub const INPUT_FILE_NAME_PLACEHOLDER: &str = "{@InputFileName}";
pub const AGENT_NAME_PLACEHOLDER: &str = "{@AgentName}";
pub const GUID_PLACEHOLDER: &str = "{@GUID}";

/// Output file name pattern for agent responses.
///
/// Placeholders are substituted verbatim; `{@GUID}` receives a fresh UUID
/// on every render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputNameTemplate(String);

impl OutputNameTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, input_file_name: &str, agent_name: &str) -> String {
        let mut rendered = self
            .0
            .replace(INPUT_FILE_NAME_PLACEHOLDER, input_file_name)
            .replace(AGENT_NAME_PLACEHOLDER, agent_name);
        if rendered.contains(GUID_PLACEHOLDER) {
            rendered = rendered.replace(GUID_PLACEHOLDER, &Uuid::new_v4().to_string());
        }
        rendered
    }

    /// Whether two renders for different inputs can yield different names.
    pub fn has_unique_component(&self) -> bool {
        self.0.contains(INPUT_FILE_NAME_PLACEHOLDER) || self.0.contains(GUID_PLACEHOLDER)
    }
}

impl Default for OutputNameTemplate {
    fn default() -> Self {
        Self::new("{@AgentName}_{@GUID}_{@InputFileName}")
    }
}

impl fmt::Display for OutputNameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
