// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent Reactor
//!
//! One reactor per `(agent, instance)`. Turns are serialized through a
//! mutex-guarded state cell: the state is loaded on first use, mutated on a
//! working copy during the turn, persisted in one `save`, and only then
//! published back into the cell. A failed turn leaves the cell untouched.
//!
//! Pipeline for a `Created` event:
//! 1. skip events already processed or produced by this reactor
//! 2. primary agents take raw input the oracle approves; derived agents take
//!    other agents' outputs and combine all of them
//! 3. transform, name the output from the template and write it with
//!    provenance metadata
//! 4. record the output name and the consumed dedup key, then persist

use metrics::counter;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::journal::{AgentMatch, CollaborationJournal, JournalError};
use crate::domain::agent::{AgentBehavior, CapabilityDescriptor, HandlerKind, ReactorRole, TransformError};
use crate::domain::events::{ChangeEvent, ChangeKind};
use crate::domain::journal::{FileMetadata, OutputNameTemplate};
use crate::domain::oracle::ContributionOracle;
use crate::domain::reactor::{Reaction, ReactorKey, ReactorState, SkipReason};
use crate::domain::state_store::{ReactorStateStore, StateStoreError};

#[derive(Debug, thiserror::Error)]
pub enum ReactorError {
    #[error("Reactor state store failed: {0}")]
    State(#[from] StateStoreError),

    #[error("Journal write failed: {0}")]
    Journal(#[from] JournalError),

    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Agent {agent} does not handle {handler}")]
    UnsupportedHandler { agent: String, handler: HandlerKind },
}

/// Collaborators shared by every reactor in the process.
#[derive(Clone)]
pub struct ReactorServices {
    pub journal: CollaborationJournal,
    pub oracle: Arc<dyn ContributionOracle>,
    pub state_store: Arc<dyn ReactorStateStore>,
    pub output_names: OutputNameTemplate,
}

pub struct AgentReactor {
    key: ReactorKey,
    descriptor: CapabilityDescriptor,
    behavior: Arc<dyn AgentBehavior>,
    services: ReactorServices,
    state: Mutex<Option<ReactorState>>,
}

impl AgentReactor {
    pub fn new(key: ReactorKey, behavior: Arc<dyn AgentBehavior>, services: ReactorServices) -> Self {
        Self {
            key,
            descriptor: behavior.descriptor().clone(),
            behavior,
            services,
            state: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &ReactorKey {
        &self.key
    }

    pub fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    /// Current state, loading it if this reactor has not run yet.
    pub async fn state(&self) -> Result<ReactorState, ReactorError> {
        let mut cell = self.state.lock().await;
        self.loaded(&mut cell).await
    }

    async fn loaded(&self, cell: &mut Option<ReactorState>) -> Result<ReactorState, ReactorError> {
        if let Some(state) = cell.as_ref() {
            return Ok(state.clone());
        }
        let state = self.services.state_store.load(&self.key).await?.unwrap_or_default();
        *cell = Some(state.clone());
        Ok(state)
    }

    /// Run one handler turn for an enriched event.
    pub async fn invoke(&self, handler: HandlerKind, event: &ChangeEvent) -> Result<Reaction, ReactorError> {
        if !self.descriptor.handlers.contains(&handler) {
            return Err(ReactorError::UnsupportedHandler {
                agent: self.key.agent.to_string(),
                handler,
            });
        }

        let mut cell = self.state.lock().await;
        let mut state = self.loaded(&mut cell).await?;

        let (reaction, changed) = match handler {
            HandlerKind::PageEvent => self.on_page_event(&mut state, event).await?,
        };

        if changed {
            self.services.state_store.save(&self.key, &state).await?;
            *cell = Some(state);
        }

        match &reaction {
            Reaction::Skipped(reason) => debug!(
                reactor = %self.key,
                file_name = %event.file_name,
                reason = %reason,
                "Reactor skipped event"
            ),
            Reaction::Unchanged => debug!(
                reactor = %self.key,
                file_name = %event.file_name,
                "Reactor result identical to an earlier one, not stored"
            ),
            Reaction::Produced { output_file } => info!(
                reactor = %self.key,
                input = %event.file_name,
                output = %output_file,
                "Reactor produced artifact"
            ),
        }
        Ok(reaction)
    }

    /// Returns the reaction and whether `state` changed.
    async fn on_page_event(
        &self,
        state: &mut ReactorState,
        event: &ChangeEvent,
    ) -> Result<(Reaction, bool), ReactorError> {
        if event.id.is_empty() {
            return Ok((Reaction::Skipped(SkipReason::MissingEventId), false));
        }
        if event.kind != ChangeKind::Created {
            return Ok((Reaction::Skipped(SkipReason::NotCreated), false));
        }
        let dedup_key = event.dedup_key();
        if state.has_processed(&dedup_key) {
            return Ok((Reaction::Skipped(SkipReason::AlreadyProcessed), false));
        }
        if state.has_provided(&event.file_name) {
            return Ok((Reaction::Skipped(SkipReason::SelfProduced), false));
        }

        match self.descriptor.role {
            ReactorRole::Primary => self.react_primary(state, event).await,
            ReactorRole::Derived => self.react_derived(state, event).await,
        }
    }

    async fn react_primary(
        &self,
        state: &mut ReactorState,
        event: &ChangeEvent,
    ) -> Result<(Reaction, bool), ReactorError> {
        if event.is_agent_created {
            return Ok((Reaction::Skipped(SkipReason::AgentCreatedInput), false));
        }

        let approved = match self
            .services
            .oracle
            .should_contribute(&event.expected_processing_output, &self.descriptor.purpose)
            .await
        {
            Ok(approved) => approved,
            Err(e) => {
                warn!(reactor = %self.key, error = %e, "Contribution oracle failed, not contributing");
                false
            }
        };
        if !approved {
            return Ok((Reaction::Skipped(SkipReason::Declined), false));
        }

        let journal = &self.services.journal;
        let input = journal.get(&event.instance_id, &event.file_name).await;
        let response = self.behavior.transform(&input).await?;

        let output_file = self
            .services
            .output_names
            .render(&event.file_name, self.key.agent.as_str());
        let metadata = FileMetadata::agent_output(&self.key.agent, vec![event.file_name.clone()]);
        journal
            .try_put(&event.instance_id, &output_file, &response, Some(&metadata))
            .await?;

        self.record_output(state, event, &output_file);
        Ok((Reaction::Produced { output_file }, true))
    }

    async fn react_derived(
        &self,
        state: &mut ReactorState,
        event: &ChangeEvent,
    ) -> Result<(Reaction, bool), ReactorError> {
        if !event.is_agent_created {
            return Ok((Reaction::Skipped(SkipReason::RawInput), false));
        }

        let journal = &self.services.journal;
        let sources = journal
            .agent_outputs(&event.instance_id, &self.key.agent, AgentMatch::Other)
            .await;
        if sources.is_empty() {
            return Ok((Reaction::Skipped(SkipReason::NoInput), false));
        }

        let input = sources
            .iter()
            .map(|entry| entry.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let response = self.behavior.transform(&input).await?;

        let previous = journal
            .agent_outputs(&event.instance_id, &self.key.agent, AgentMatch::Same)
            .await;
        if previous.iter().any(|entry| entry.content == response) {
            // Consume the event so redelivery does not recompute
            state.mark_processed(event.dedup_key());
            return Ok((Reaction::Unchanged, true));
        }

        let output_file = self
            .services
            .output_names
            .render(&event.file_name, self.key.agent.as_str());
        let input_files = sources.into_iter().map(|entry| entry.file_name).collect();
        let metadata = FileMetadata::agent_output(&self.key.agent, input_files);
        journal
            .try_put(&event.instance_id, &output_file, &response, Some(&metadata))
            .await?;

        self.record_output(state, event, &output_file);
        Ok((Reaction::Produced { output_file }, true))
    }

    fn record_output(&self, state: &mut ReactorState, event: &ChangeEvent, output_file: &str) {
        state.mark_provided(output_file);
        state.mark_processed(event.dedup_key());
        counter!("collab_artifacts_produced_total", "agent" => self.key.agent.to_string()).increment(1);
    }
}
