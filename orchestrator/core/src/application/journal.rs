// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Collaboration Journal Application Service
//!
//! Key-value view over the collaboration container, keyed by
//! `(instance_id, file_name)` and stored at `{instance_id}/{file_name}`.
//!
//! Every operation exists twice:
//! - `try_*` returns a typed [`Result`] so callers can tell a miss from an outage
//! - the plain name degrades to an empty/false value and logs the failure,
//!   which is what the reactors and the router use
//!
//! [`CollaborationJournal::try_put`] writes content and metadata in two steps.
//! A reader in between sees the new content with the previous (or default)
//! metadata. [`CollaborationJournal::try_put_input`] is a single upload.

use metrics::counter;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::agent::AgentIdentity;
use crate::domain::journal::{journal_path, split_journal_path, FileMetadata, InstanceId, JournalEntry};
use crate::domain::storage::{BlobStore, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("Journal entry not found: {instance_id}/{file_name}")]
    NotFound {
        instance_id: InstanceId,
        file_name: String,
    },

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Journal backend error: {0}")]
    Backend(#[from] StorageError),
}

impl JournalError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, JournalError::NotFound { .. })
    }
}

/// Which agent-created entries [`CollaborationJournal::try_agent_outputs`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMatch {
    /// Produced by the given agent.
    Same,
    /// Produced by any other agent.
    Other,
}

#[derive(Clone)]
pub struct CollaborationJournal {
    store: Arc<dyn BlobStore>,
}

impl CollaborationJournal {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub fn container(&self) -> &str {
        self.store.container()
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    fn path(instance_id: &InstanceId, file_name: &str) -> Result<String, JournalError> {
        if instance_id.is_empty() || file_name.is_empty() || file_name.contains('/') {
            return Err(JournalError::InvalidFileName(format!("{}/{}", instance_id, file_name)));
        }
        Ok(journal_path(instance_id, file_name))
    }

    fn map_not_found(err: StorageError, instance_id: &InstanceId, file_name: &str) -> JournalError {
        match err {
            StorageError::NotFound(_) => JournalError::NotFound {
                instance_id: instance_id.clone(),
                file_name: file_name.to_string(),
            },
            other => JournalError::Backend(other),
        }
    }

    // ------------------------------------------------------------------
    // Typed operations
    // ------------------------------------------------------------------

    pub async fn try_get(&self, instance_id: &InstanceId, file_name: &str) -> Result<String, JournalError> {
        let path = Self::path(instance_id, file_name)?;
        self.store
            .download(&path)
            .await
            .map_err(|e| Self::map_not_found(e, instance_id, file_name))
    }

    pub async fn try_get_metadata(
        &self,
        instance_id: &InstanceId,
        file_name: &str,
    ) -> Result<FileMetadata, JournalError> {
        let path = Self::path(instance_id, file_name)?;
        let properties = self
            .store
            .properties(&path)
            .await
            .map_err(|e| Self::map_not_found(e, instance_id, file_name))?;
        Ok(FileMetadata::from_blob_metadata(&properties.metadata))
    }

    /// Overwrite content, then attach `metadata` when given.
    pub async fn try_put(
        &self,
        instance_id: &InstanceId,
        file_name: &str,
        content: &str,
        metadata: Option<&FileMetadata>,
    ) -> Result<(), JournalError> {
        let path = Self::path(instance_id, file_name)?;
        self.store.upload(&path, content, None, true).await?;
        if let Some(metadata) = metadata {
            self.store.set_metadata(&path, metadata.to_blob_metadata()).await?;
        }
        debug!(instance_id = %instance_id, file_name, "Stored journal entry");
        Ok(())
    }

    pub async fn try_set_metadata(
        &self,
        instance_id: &InstanceId,
        file_name: &str,
        metadata: &FileMetadata,
    ) -> Result<(), JournalError> {
        let path = Self::path(instance_id, file_name)?;
        self.store
            .set_metadata(&path, metadata.to_blob_metadata())
            .await
            .map_err(|e| Self::map_not_found(e, instance_id, file_name))
    }

    /// Replace raw input: delete any previous entry, then upload content and
    /// metadata together.
    pub async fn try_put_input(
        &self,
        instance_id: &InstanceId,
        file_name: &str,
        content: &str,
        metadata: &FileMetadata,
    ) -> Result<(), JournalError> {
        let path = Self::path(instance_id, file_name)?;
        self.store.delete_if_exists(&path).await?;
        self.store
            .upload(&path, content, Some(metadata.to_blob_metadata()), true)
            .await?;
        debug!(instance_id = %instance_id, file_name, "Stored raw input");
        Ok(())
    }

    /// File names of an instance, oldest first. Ties are broken by name.
    pub async fn try_list(&self, instance_id: &InstanceId) -> Result<Vec<String>, JournalError> {
        let prefix = format!("{}/", instance_id);
        let paths = self.store.list(Some(&prefix)).await?;

        let mut dated = Vec::with_capacity(paths.len());
        for path in paths {
            let Some((_, file_name)) = split_journal_path(&path) else {
                continue;
            };
            // Nested paths are not journal entries
            if file_name.contains('/') {
                continue;
            }
            match self.store.properties(&path).await {
                Ok(properties) => dated.push((properties.created_on, file_name.to_string())),
                // Deleted between list and properties
                Err(StorageError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        dated.sort();
        Ok(dated.into_iter().map(|(_, name)| name).collect())
    }

    /// Distinct first path segments of all stored entries, sorted.
    pub async fn try_list_instances(&self) -> Result<Vec<InstanceId>, JournalError> {
        let paths = self.store.list(None).await?;
        let mut instances: Vec<InstanceId> = paths
            .iter()
            .filter_map(|path| split_journal_path(path).map(|(instance, _)| instance))
            .collect();
        instances.sort();
        instances.dedup();
        Ok(instances)
    }

    /// All entries of an instance with content and metadata, oldest first.
    pub async fn try_entries(&self, instance_id: &InstanceId) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries = Vec::new();
        for file_name in self.try_list(instance_id).await? {
            let path = Self::path(instance_id, &file_name)?;
            let properties = match self.store.properties(&path).await {
                Ok(properties) => properties,
                Err(StorageError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            let content = match self.store.download(&path).await {
                Ok(content) => content,
                Err(StorageError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            entries.push(JournalEntry {
                instance_id: instance_id.clone(),
                file_name,
                content,
                metadata: FileMetadata::from_blob_metadata(&properties.metadata),
                created_at: properties.created_on,
            });
        }
        Ok(entries)
    }

    /// Agent-created entries whose producer is (or is not) `agent`, oldest first.
    pub async fn try_agent_outputs(
        &self,
        instance_id: &InstanceId,
        agent: &AgentIdentity,
        agent_match: AgentMatch,
    ) -> Result<Vec<JournalEntry>, JournalError> {
        let entries = self.try_entries(instance_id).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.metadata.is_agent_created)
            .filter(|entry| {
                let same = entry.metadata.agent_name == agent.as_str();
                match agent_match {
                    AgentMatch::Same => same,
                    AgentMatch::Other => !same,
                }
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Degrading entry points
    // ------------------------------------------------------------------

    /// Content of an entry, empty on miss or failure.
    pub async fn get(&self, instance_id: &InstanceId, file_name: &str) -> String {
        self.try_get(instance_id, file_name)
            .await
            .unwrap_or_else(|e| degrade("get", instance_id, &e))
    }

    /// Metadata of an entry, default on miss or failure.
    pub async fn get_metadata(&self, instance_id: &InstanceId, file_name: &str) -> FileMetadata {
        self.try_get_metadata(instance_id, file_name)
            .await
            .unwrap_or_else(|e| degrade("get_metadata", instance_id, &e))
    }

    pub async fn put(
        &self,
        instance_id: &InstanceId,
        file_name: &str,
        content: &str,
        metadata: Option<&FileMetadata>,
    ) -> bool {
        match self.try_put(instance_id, file_name, content, metadata).await {
            Ok(()) => true,
            Err(e) => degrade("put", instance_id, &e),
        }
    }

    pub async fn set_metadata(&self, instance_id: &InstanceId, file_name: &str, metadata: &FileMetadata) -> bool {
        match self.try_set_metadata(instance_id, file_name, metadata).await {
            Ok(()) => true,
            Err(e) => degrade("set_metadata", instance_id, &e),
        }
    }

    pub async fn put_input(
        &self,
        instance_id: &InstanceId,
        file_name: &str,
        content: &str,
        metadata: &FileMetadata,
    ) -> bool {
        match self.try_put_input(instance_id, file_name, content, metadata).await {
            Ok(()) => true,
            Err(e) => degrade("put_input", instance_id, &e),
        }
    }

    pub async fn list(&self, instance_id: &InstanceId) -> Vec<String> {
        self.try_list(instance_id)
            .await
            .unwrap_or_else(|e| degrade("list", instance_id, &e))
    }

    pub async fn list_instances(&self) -> Vec<InstanceId> {
        self.try_list_instances()
            .await
            .unwrap_or_else(|e| degrade("list_instances", &InstanceId::default(), &e))
    }

    pub async fn entries(&self, instance_id: &InstanceId) -> Vec<JournalEntry> {
        self.try_entries(instance_id)
            .await
            .unwrap_or_else(|e| degrade("entries", instance_id, &e))
    }

    pub async fn agent_outputs(
        &self,
        instance_id: &InstanceId,
        agent: &AgentIdentity,
        agent_match: AgentMatch,
    ) -> Vec<JournalEntry> {
        self.try_agent_outputs(instance_id, agent, agent_match)
            .await
            .unwrap_or_else(|e| degrade("agent_outputs", instance_id, &e))
    }
}

/// Log a failed journal operation and yield the type's empty value.
fn degrade<T: Default>(operation: &'static str, instance_id: &InstanceId, error: &JournalError) -> T {
    if error.is_not_found() {
        debug!(operation, instance_id = %instance_id, error = %error, "Journal miss");
    } else {
        counter!("collab_journal_degraded_total", "operation" => operation).increment(1);
        warn!(
            operation,
            instance_id = %instance_id,
            error = %error,
            "Journal operation failed, returning empty result"
        );
    }
    T::default()
}
