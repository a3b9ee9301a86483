// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Capability Registry
//!
//! Explicit table of the agents this process hosts, built once at startup
//! from a list of behaviors and immutable afterwards. Iteration follows
//! registration order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::agent::{AgentBehavior, AgentIdentity, CapabilityDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Agent registered twice: {0}")]
    DuplicateIdentity(AgentIdentity),

    #[error("Agent {0} exposes no event handlers")]
    NoHandlers(AgentIdentity),
}

/// One registry row.
#[derive(Clone)]
pub struct Registration {
    pub descriptor: CapabilityDescriptor,
    pub behavior: Arc<dyn AgentBehavior>,
}

#[derive(Default)]
pub struct CapabilityRegistryBuilder {
    registrations: Vec<Registration>,
}

impl CapabilityRegistryBuilder {
    pub fn register(mut self, behavior: Arc<dyn AgentBehavior>) -> Self {
        self.registrations.push(Registration {
            descriptor: behavior.descriptor().clone(),
            behavior,
        });
        self
    }

    pub fn build(self) -> Result<CapabilityRegistry, RegistryError> {
        let mut index = HashMap::with_capacity(self.registrations.len());
        for (position, registration) in self.registrations.iter().enumerate() {
            let identity = &registration.descriptor.identity;
            if registration.descriptor.handlers.is_empty() {
                return Err(RegistryError::NoHandlers(identity.clone()));
            }
            if index.insert(identity.clone(), position).is_some() {
                return Err(RegistryError::DuplicateIdentity(identity.clone()));
            }
        }
        Ok(CapabilityRegistry {
            registrations: self.registrations,
            index,
        })
    }
}

pub struct CapabilityRegistry {
    registrations: Vec<Registration>,
    index: HashMap<AgentIdentity, usize>,
}

impl CapabilityRegistry {
    pub fn builder() -> CapabilityRegistryBuilder {
        CapabilityRegistryBuilder::default()
    }

    pub fn get(&self, identity: &AgentIdentity) -> Option<&Registration> {
        self.index.get(identity).map(|&i| &self.registrations[i])
    }

    pub fn descriptor(&self, identity: &AgentIdentity) -> Option<&CapabilityDescriptor> {
        self.get(identity).map(|r| &r.descriptor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.registrations.iter().map(|r| &r.descriptor)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
