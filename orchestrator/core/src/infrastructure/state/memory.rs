// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::domain::reactor::{ReactorKey, ReactorState};
use crate::domain::state_store::{ReactorStateStore, StateStoreError};

/// Process-local state store. State is lost on restart.
#[derive(Default)]
pub struct InMemoryReactorStateStore {
    states: RwLock<HashMap<ReactorKey, ReactorState>>,
}

impl InMemoryReactorStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys persisted so far, sorted.
    pub fn keys(&self) -> Vec<ReactorKey> {
        let mut keys: Vec<ReactorKey> = self.states.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ReactorStateStore for InMemoryReactorStateStore {
    async fn load(&self, key: &ReactorKey) -> Result<Option<ReactorState>, StateStoreError> {
        Ok(self.states.read().get(key).cloned())
    }

    async fn save(&self, key: &ReactorKey, state: &ReactorState) -> Result<(), StateStoreError> {
        self.states.write().insert(key.clone(), state.clone());
        Ok(())
    }
}
