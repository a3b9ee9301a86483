// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Durable reactor state persistence.
//!
//! Decoupled from the event transport: the reactor loads its state on first
//! activation and writes the whole record back in a single `save`.

use async_trait::async_trait;

use crate::domain::reactor::{ReactorKey, ReactorState};

#[async_trait]
pub trait ReactorStateStore: Send + Sync {
    /// Load state, `None` if the reactor was never persisted.
    async fn load(&self, key: &ReactorKey) -> Result<Option<ReactorState>, StateStoreError>;

    async fn save(&self, key: &ReactorKey, state: &ReactorState) -> Result<(), StateStoreError>;

    async fn health_check(&self) -> Result<(), StateStoreError> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateStoreError {
    #[error("State store IO error: {0}")]
    Io(String),

    #[error("State serialization error: {0}")]
    Serialization(String),

    #[error("State store unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for StateStoreError {
    fn from(err: std::io::Error) -> Self {
        StateStoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StateStoreError {
    fn from(err: serde_json::Error) -> Self {
        StateStoreError::Serialization(err.to_string())
    }
}
