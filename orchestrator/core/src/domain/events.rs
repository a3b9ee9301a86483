// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Storage change events.
//!
//! [`ChangeEventEnvelope`] is the wire shape delivered by the transport
//! (`{id, type, subject, time, data: {url}}`). [`ChangeEvent`] is the parsed
//! form the router works with: kind, instance and file name are derived from
//! the envelope and the provenance fields are filled in from the journal
//! before dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::journal::{FileMetadata, InstanceId};

pub const BLOB_CREATED_EVENT_TYPE: &str = "Microsoft.Storage.BlobCreated";
pub const BLOB_DELETED_EVENT_TYPE: &str = "Microsoft.Storage.BlobDeleted";

/// Account host used in `data.url` by the in-process store adapters.
pub const LOCAL_ACCOUNT_HOST: &str = "localhost";

/// Wire representation of a storage change event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeEventEnvelope {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub data: ChangeEventData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeEventData {
    #[serde(default)]
    pub url: String,
}

impl ChangeEventEnvelope {
    /// Envelope for a change to `blob_path` inside `container`, stamped now.
    pub fn for_blob(kind: ChangeKind, container: &str, blob_path: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type: kind.event_type().to_string(),
            subject: format!(
                "/blobServices/default/containers/{}/blobs/{}",
                container, blob_path
            ),
            time: Utc::now(),
            data: ChangeEventData {
                url: format!("https://{}/{}/{}", LOCAL_ACCOUNT_HOST, container, blob_path),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Deleted,
    #[default]
    Other,
}

impl ChangeKind {
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            BLOB_CREATED_EVENT_TYPE => ChangeKind::Created,
            BLOB_DELETED_EVENT_TYPE => ChangeKind::Deleted,
            _ => ChangeKind::Other,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            ChangeKind::Created => BLOB_CREATED_EVENT_TYPE,
            ChangeKind::Deleted => BLOB_DELETED_EVENT_TYPE,
            ChangeKind::Other => "",
        }
    }
}

/// Key identifying a single delivery of a file change to a reactor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DedupKey {
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
}

/// Split a subject path into `(instance_id, file_name)`.
///
/// The instance is the second-to-last segment and the file the last one.
/// A second-to-last segment of `blob` or `blobs` (any case) means the file sits
/// at the container root and has no instance.
pub fn parse_subject(subject: &str) -> (InstanceId, String) {
    let segments: Vec<&str> = subject.split('/').collect();
    let file_name = segments.last().copied().unwrap_or_default().to_string();
    if segments.len() < 2 {
        return (InstanceId::default(), file_name);
    }

    let instance = segments[segments.len() - 2];
    if instance.eq_ignore_ascii_case("blob") || instance.eq_ignore_ascii_case("blobs") {
        return (InstanceId::default(), file_name);
    }
    (InstanceId::new(instance), file_name)
}

/// Parsed and (after routing) enriched change event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeEvent {
    pub id: String,
    pub kind: ChangeKind,
    pub subject: String,
    pub timestamp: DateTime<Utc>,
    pub source_url: String,
    pub instance_id: InstanceId,
    pub file_name: String,

    // Copied from the journal entry's metadata by the router.
    pub agent_name: String,
    pub is_agent_created: bool,
    pub input_files: Vec<String>,
    pub additional_output_files: Vec<String>,
    pub expected_processing_output: String,
}

impl ChangeEvent {
    pub fn from_envelope(envelope: ChangeEventEnvelope) -> Self {
        let (instance_id, file_name) = parse_subject(&envelope.subject);
        Self {
            id: envelope.id,
            kind: ChangeKind::from_event_type(&envelope.event_type),
            subject: envelope.subject,
            timestamp: envelope.time,
            source_url: envelope.data.url,
            instance_id,
            file_name,
            ..Default::default()
        }
    }

    /// Parse a transport message body. Malformed bodies yield an empty event,
    /// which the router then drops for lacking an instance.
    pub fn from_json(body: &str) -> Self {
        match serde_json::from_str::<ChangeEventEnvelope>(body) {
            Ok(envelope) => Self::from_envelope(envelope),
            Err(e) => {
                debug!(error = %e, "Discarding malformed change event body");
                Self::default()
            }
        }
    }

    pub fn to_envelope(&self) -> ChangeEventEnvelope {
        ChangeEventEnvelope {
            id: self.id.clone(),
            event_type: self.kind.event_type().to_string(),
            subject: self.subject.clone(),
            time: self.timestamp,
            data: ChangeEventData {
                url: self.source_url.clone(),
            },
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            file_name: self.file_name.clone(),
            timestamp: self.timestamp,
        }
    }

    /// Copy provenance fields from the entry's metadata.
    pub fn enrich(&mut self, metadata: &FileMetadata) {
        self.agent_name = metadata.agent_name.clone();
        self.is_agent_created = metadata.is_agent_created;
        self.input_files = metadata.input_files.clone();
        self.additional_output_files = metadata.additional_output_files.clone();
        self.expected_processing_output = metadata.expected_processing_output.clone();
    }

    pub fn has_instance(&self) -> bool {
        !self.instance_id.is_empty()
    }
}

impl From<ChangeEventEnvelope> for ChangeEvent {
    fn from(envelope: ChangeEventEnvelope) -> Self {
        Self::from_envelope(envelope)
    }
}
