// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory blob store for tests and single-process runs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::domain::events::{ChangeEventEnvelope, ChangeKind};
use crate::domain::storage::{
    validate_blob_path, BlobMetadata, BlobProperties, BlobStore, StorageError,
};
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug, Clone)]
struct StoredBlob {
    content: String,
    metadata: BlobMetadata,
    created_on: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    blobs: HashMap<String, StoredBlob>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Inner {
    /// Strictly increasing clock so creation order is total within the store.
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

pub struct InMemoryBlobStore {
    container: String,
    inner: RwLock<Inner>,
    bus: Option<EventBus>,
}

impl InMemoryBlobStore {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            inner: RwLock::new(Inner::default()),
            bus: None,
        }
    }

    /// Publish a change notification for every upload and delete.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Upload with an explicit creation time and no notification.
    ///
    /// Used to seed histories whose creation order differs from write order.
    pub fn upload_at(
        &self,
        path: &str,
        content: &str,
        metadata: BlobMetadata,
        created_on: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        validate_blob_path(path)?;
        self.inner.write().blobs.insert(
            path.to_string(),
            StoredBlob {
                content: content.to_string(),
                metadata,
                created_on,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().blobs.is_empty()
    }

    fn notify(&self, kind: ChangeKind, path: &str, time: DateTime<Utc>) {
        if let Some(bus) = &self.bus {
            let mut envelope = ChangeEventEnvelope::for_blob(kind, &self.container, path);
            envelope.time = time;
            bus.publish_envelope(&envelope);
        }
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn upload(
        &self,
        path: &str,
        content: &str,
        metadata: Option<BlobMetadata>,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        validate_blob_path(path)?;
        let stamp = {
            let mut inner = self.inner.write();
            let stamp = inner.next_stamp();
            match inner.blobs.entry(path.to_string()) {
                Entry::Occupied(_) if !overwrite => {
                    return Err(StorageError::AlreadyExists(path.to_string()));
                }
                Entry::Occupied(mut entry) => {
                    let existing = entry.get_mut();
                    existing.content = content.to_string();
                    if let Some(metadata) = metadata {
                        existing.metadata = metadata;
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(StoredBlob {
                        content: content.to_string(),
                        metadata: metadata.unwrap_or_default(),
                        created_on: stamp,
                    });
                }
            }
            stamp
        };
        self.notify(ChangeKind::Created, path, stamp);
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<String, StorageError> {
        self.inner
            .read()
            .blobs
            .get(path)
            .map(|blob| blob.content.clone())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn delete_if_exists(&self, path: &str) -> Result<bool, StorageError> {
        let removed = {
            let mut inner = self.inner.write();
            let stamp = inner.next_stamp();
            inner.blobs.remove(path).map(|_| stamp)
        };
        match removed {
            Some(stamp) => {
                self.notify(ChangeKind::Deleted, path, stamp);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn properties(&self, path: &str) -> Result<BlobProperties, StorageError> {
        self.inner
            .read()
            .blobs
            .get(path)
            .map(|blob| BlobProperties {
                created_on: blob.created_on,
                content_length: blob.content.len() as u64,
                metadata: blob.metadata.clone(),
            })
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn set_metadata(&self, path: &str, metadata: BlobMetadata) -> Result<(), StorageError> {
        let mut inner = self.inner.write();
        let blob = inner
            .blobs
            .get_mut(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        blob.metadata = metadata;
        Ok(())
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.read();
        let mut paths: Vec<String> = inner
            .blobs
            .keys()
            .filter(|path| prefix.is_none_or(|p| path.starts_with(p)))
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }
}
