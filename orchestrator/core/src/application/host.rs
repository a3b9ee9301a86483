// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Reactor host: resolves or creates the reactor for `(agent, instance)`.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::reactor::{AgentReactor, ReactorServices};
use crate::application::registry::{CapabilityRegistry, Registration};
use crate::application::router::ReadinessProbe;
use crate::domain::journal::InstanceId;
use crate::domain::reactor::ReactorKey;

pub struct ReactorHost {
    registry: Arc<CapabilityRegistry>,
    services: ReactorServices,
    reactors: DashMap<ReactorKey, Arc<AgentReactor>>,
}

impl ReactorHost {
    pub fn new(registry: Arc<CapabilityRegistry>, services: ReactorServices) -> Self {
        Self {
            registry,
            services,
            reactors: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn services(&self) -> &ReactorServices {
        &self.services
    }

    /// Reactor for a registered agent on an instance, created on first use.
    pub fn reactor(&self, registration: &Registration, instance_id: &InstanceId) -> Arc<AgentReactor> {
        let key = ReactorKey::new(registration.descriptor.identity.clone(), instance_id.clone());
        self.reactors
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(reactor = %key, "Activating reactor");
                Arc::new(AgentReactor::new(
                    key.clone(),
                    registration.behavior.clone(),
                    self.services.clone(),
                ))
            })
            .clone()
    }

    pub fn get(&self, key: &ReactorKey) -> Option<Arc<AgentReactor>> {
        self.reactors.get(key).map(|r| r.clone())
    }

    pub fn active_reactors(&self) -> usize {
        self.reactors.len()
    }
}

#[async_trait]
impl ReadinessProbe for ReactorHost {
    async fn is_ready(&self) -> bool {
        if self.registry.is_empty() {
            warn!("Reactor host has no registered agents");
            return false;
        }
        if let Err(e) = self.services.state_store.health_check().await {
            debug!(error = %e, "Reactor state store not ready");
            return false;
        }
        if let Err(e) = self.services.journal.store().health_check().await {
            debug!(error = %e, "Journal store not ready");
            return false;
        }
        true
    }
}
