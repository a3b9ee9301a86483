// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File-backed reactor state store.
//!
//! One JSON document per reactor at `{dir}/{instance}/{agent}.json`, replaced
//! by writing a temporary file and renaming it over the old one.

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::reactor::{ReactorKey, ReactorState};
use crate::domain::state_store::{ReactorStateStore, StateStoreError};

pub struct FileReactorStateStore {
    dir: PathBuf,
}

impl FileReactorStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StateStoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            StateStoreError::Io(format!("Failed to create state directory {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    fn state_path(&self, key: &ReactorKey) -> PathBuf {
        self.dir
            .join(sanitize(key.instance_id.as_str()))
            .join(format!("{}.json", sanitize(key.agent.as_str())))
    }
}

/// Map an identifier onto a single safe path component.
fn sanitize(component: &str) -> String {
    let cleaned: String = component
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => format!("_{}", cleaned),
        _ => cleaned,
    }
}

#[async_trait]
impl ReactorStateStore for FileReactorStateStore {
    async fn load(&self, key: &ReactorKey) -> Result<Option<ReactorState>, StateStoreError> {
        match tokio::fs::read(self.state_path(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &ReactorKey, state: &ReactorState) -> Result<(), StateStoreError> {
        let target = self.state_path(key);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = target.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(state)?).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StateStoreError> {
        if tokio::fs::try_exists(&self.dir).await? {
            Ok(())
        } else {
            Err(StateStoreError::Unavailable(format!(
                "State directory {} is missing",
                self.dir.display()
            )))
        }
    }
}
