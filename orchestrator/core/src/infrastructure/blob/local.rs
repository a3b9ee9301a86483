// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Filesystem Blob Store
//!
//! Directory-backed implementation of [`BlobStore`] for single-node runs and
//! for sharing a collaboration page between separate `collab` invocations.
//!
//! **Layout:**
//! - `{base}/{container}/{instance}/{file}` holds the content
//! - `{base}/{container}/.meta/{instance}/{file}.json` holds the creation time
//!   and metadata map
//!
//! **Limitations:**
//! - Content and sidecar are separate files; a crash between the two writes
//!   leaves content without metadata, which readers see as default metadata
//! - Change notifications only reach subscribers in the same process

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::domain::events::{ChangeEventEnvelope, ChangeKind};
use crate::domain::storage::{
    validate_blob_path, BlobMetadata, BlobProperties, BlobStore, StorageError,
};
use crate::infrastructure::event_bus::EventBus;

const META_DIR: &str = ".meta";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Sidecar {
    created_on: DateTime<Utc>,
    #[serde(default)]
    metadata: BlobMetadata,
}

/// Local filesystem blob store
pub struct LocalBlobStore {
    root: PathBuf,
    container: String,
    bus: Option<EventBus>,
}

impl LocalBlobStore {
    /// Create the store, creating `{base}/{container}` if needed
    ///
    /// # Returns
    /// * `Err(StorageError::IoError)` if the directory cannot be created or written
    pub fn new(base_path: impl Into<PathBuf>, container: impl Into<String>) -> Result<Self, StorageError> {
        let container = container.into();
        let root = base_path.into().join(&container);

        std::fs::create_dir_all(root.join(META_DIR)).map_err(|e| {
            StorageError::IoError(format!(
                "Failed to create container directory {}: {}",
                root.display(),
                e
            ))
        })?;

        // Verify directory is writable
        let probe = root.join(".collab-storage-test");
        std::fs::write(&probe, b"test").map_err(|e| {
            StorageError::IoError(format!("Container directory {} is not writable: {}", root.display(), e))
        })?;
        std::fs::remove_file(&probe)?;

        Ok(Self {
            root,
            container,
            bus: None,
        })
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn content_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_blob_path(path)?;
        if path.split('/').next() == Some(META_DIR) {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(path))
    }

    fn sidecar_path(&self, path: &str) -> PathBuf {
        self.root.join(META_DIR).join(format!("{}.json", path))
    }

    async fn read_sidecar(&self, path: &str) -> Result<Option<Sidecar>, StorageError> {
        match tokio::fs::read(self.sidecar_path(path)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_sidecar(&self, path: &str, sidecar: &Sidecar) -> Result<(), StorageError> {
        let target = self.sidecar_path(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(target, serde_json::to_vec(sidecar)?).await?;
        Ok(())
    }

    fn notify(&self, kind: ChangeKind, path: &str) {
        if let Some(bus) = &self.bus {
            bus.publish_envelope(&ChangeEventEnvelope::for_blob(kind, &self.container, path));
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
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
        let target = self.content_path(path)?;
        let exists = tokio::fs::try_exists(&target).await?;
        if exists && !overwrite {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content.as_bytes()).await?;

        let previous = if exists { self.read_sidecar(path).await.ok().flatten() } else { None };
        let sidecar = match (previous, metadata) {
            (Some(previous), None) => previous,
            (Some(previous), Some(metadata)) => Sidecar {
                created_on: previous.created_on,
                metadata,
            },
            (None, metadata) => Sidecar {
                created_on: Utc::now(),
                metadata: metadata.unwrap_or_default(),
            },
        };
        self.write_sidecar(path, &sidecar).await?;

        debug!(path, container = %self.container, "Uploaded blob");
        self.notify(ChangeKind::Created, path);
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<String, StorageError> {
        let target = self.content_path(path)?;
        match tokio::fs::read_to_string(&target).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_if_exists(&self, path: &str) -> Result<bool, StorageError> {
        let target = self.content_path(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        if let Err(e) = tokio::fs::remove_file(self.sidecar_path(path)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(e.into());
            }
        }
        self.notify(ChangeKind::Deleted, path);
        Ok(true)
    }

    async fn properties(&self, path: &str) -> Result<BlobProperties, StorageError> {
        let target = self.content_path(path)?;
        let file_meta = match tokio::fs::metadata(&target).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let sidecar = self.read_sidecar(path).await?;
        let (created_on, metadata) = match sidecar {
            Some(sidecar) => (sidecar.created_on, sidecar.metadata),
            None => {
                let modified = file_meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now());
                (modified, BlobMetadata::new())
            }
        };

        Ok(BlobProperties {
            created_on,
            content_length: file_meta.len(),
            metadata,
        })
    }

    async fn set_metadata(&self, path: &str, metadata: BlobMetadata) -> Result<(), StorageError> {
        let properties = self.properties(path).await?;
        self.write_sidecar(
            path,
            &Sidecar {
                created_on: properties.created_on,
                metadata,
            },
        )
        .await
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        let root = self.root.clone();
        let prefix = prefix.map(str::to_string);

        let mut paths = tokio::task::spawn_blocking(move || -> Result<Vec<String>, StorageError> {
            let mut paths = Vec::new();
            let walker = WalkDir::new(&root)
                .min_depth(1)
                .into_iter()
                .filter_entry(|entry| entry.file_name() != META_DIR);
            for entry in walker {
                let entry = entry.map_err(|e| StorageError::IoError(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                let path = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if prefix.as_deref().is_none_or(|p| path.starts_with(p)) {
                    paths.push(path);
                }
            }
            Ok(paths)
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("Listing task failed: {}", e)))??;

        paths.sort();
        Ok(paths)
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        if tokio::fs::try_exists(&self.root).await? {
            Ok(())
        } else {
            Err(StorageError::Unavailable(format!(
                "Container directory {} is missing",
                self.root.display()
            )))
        }
    }
}
