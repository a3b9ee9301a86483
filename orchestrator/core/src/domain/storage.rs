// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Blob Store Trait - Anti-Corruption Layer for the collaboration container
//!
//! Abstracts the object store holding the collaboration page so the journal
//! can run against an in-memory fake, a local directory or a cloud container.
//! Adapters that sit on a change feed publish a change event for every upload
//! and delete; metadata updates publish nothing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Flat string map attached to each blob.
pub type BlobMetadata = HashMap<String, String>;

/// Blob properties returned by [`BlobStore::properties`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobProperties {
    /// Set on first upload; survives overwrites, reset by delete.
    pub created_on: DateTime<Utc>,
    pub content_length: u64,
    pub metadata: BlobMetadata,
}

/// Object store holding one collaboration container.
///
/// Paths are relative to the container, e.g. `"inst-1/report.txt"`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Name of the container this store serves.
    fn container(&self) -> &str;

    /// Upload content, replacing metadata with `metadata` when given.
    ///
    /// # Returns
    /// * `Err(StorageError::AlreadyExists)` if the blob exists and `overwrite` is false
    async fn upload(
        &self,
        path: &str,
        content: &str,
        metadata: Option<BlobMetadata>,
        overwrite: bool,
    ) -> Result<(), StorageError>;

    /// Download blob content as UTF-8 text.
    async fn download(&self, path: &str) -> Result<String, StorageError>;

    /// Delete a blob. Returns whether it existed.
    async fn delete_if_exists(&self, path: &str) -> Result<bool, StorageError>;

    async fn properties(&self, path: &str) -> Result<BlobProperties, StorageError>;

    /// Replace the blob's metadata map.
    async fn set_metadata(&self, path: &str, metadata: BlobMetadata) -> Result<(), StorageError>;

    /// List blob paths, optionally restricted to a prefix.
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError>;

    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Blob already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err.to_string())
    }
}

/// Reject paths that could escape the container.
pub fn validate_blob_path(path: &str) -> Result<(), StorageError> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}
