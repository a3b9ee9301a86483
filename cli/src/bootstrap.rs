// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process runtime assembly
//!
//! Builds the journal, state store, chat provider, oracle, registry, reactor
//! host and router from a [`RuntimeConfig`]. Every command constructs only
//! what it needs: inspection commands open the journal alone.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use collabpage_core::application::{CollaborationJournal, EventRouter, ReactorHost, ReactorServices};
use collabpage_core::domain::config::{RuntimeConfig, StateBackend, StorageBackend};
use collabpage_core::domain::llm::ChatCompletion;
use collabpage_core::domain::state_store::ReactorStateStore;
use collabpage_core::domain::storage::BlobStore;
use collabpage_core::infrastructure::blob::{InMemoryBlobStore, LocalBlobStore};
use collabpage_core::infrastructure::llm::chat_completion_from_config;
use collabpage_core::infrastructure::state::{FileReactorStateStore, InMemoryReactorStateStore};
use collabpage_core::infrastructure::{EventBus, LlmContributionOracle};

/// Open the configured blob store, publishing its changes to `bus` when given.
pub fn open_store(config: &RuntimeConfig, bus: Option<EventBus>) -> Result<Arc<dyn BlobStore>> {
    let storage = &config.spec.storage;
    let store: Arc<dyn BlobStore> = match storage.backend {
        StorageBackend::Memory => {
            let store = InMemoryBlobStore::new(storage.container.clone());
            Arc::new(match bus {
                Some(bus) => store.with_event_bus(bus),
                None => store,
            })
        }
        StorageBackend::Local => {
            let store = LocalBlobStore::new(&storage.path, storage.container.clone())
                .with_context(|| format!("Failed to open blob store at {}", storage.path.display()))?;
            Arc::new(match bus {
                Some(bus) => store.with_event_bus(bus),
                None => store,
            })
        }
    };
    info!(backend = ?storage.backend, container = %storage.container, "Opened collaboration store");
    Ok(store)
}

pub fn open_journal(config: &RuntimeConfig) -> Result<CollaborationJournal> {
    Ok(CollaborationJournal::new(open_store(config, None)?))
}

pub fn open_state_store(config: &RuntimeConfig) -> Result<Arc<dyn ReactorStateStore>> {
    let state = &config.spec.state;
    Ok(match state.backend {
        StateBackend::Memory => Arc::new(InMemoryReactorStateStore::new()),
        StateBackend::File => Arc::new(
            FileReactorStateStore::new(&state.dir)
                .with_context(|| format!("Failed to open reactor state at {}", state.dir.display()))?,
        ),
    })
}

/// The configured chat provider. Fails when no LLM section is configured.
pub fn build_chat(config: &RuntimeConfig) -> Result<Arc<dyn ChatCompletion>> {
    let llm = config.spec.llm.as_ref().context(
        "No LLM configured: add spec.llm to the config file or set OA_AOAI_ENDPOINT, \
         OA_AOAI_APIKEY and OA_CHATCOMPLETION_DEPLOYMENTNAME",
    )?;
    chat_completion_from_config(llm)
}

/// Everything needed to host reactors and route events in this process.
pub struct Runtime {
    pub config: RuntimeConfig,
    pub bus: EventBus,
    pub journal: CollaborationJournal,
    pub chat: Arc<dyn ChatCompletion>,
    pub host: Arc<ReactorHost>,
    pub router: Arc<EventRouter>,
}

impl Runtime {
    pub fn build(config: RuntimeConfig) -> Result<Self> {
        let chat = build_chat(&config)?;
        Self::with_chat(config, chat)
    }

    /// Assemble the runtime around an existing chat provider.
    pub fn with_chat(config: RuntimeConfig, chat: Arc<dyn ChatCompletion>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let bus = EventBus::new(config.spec.router.bus_capacity);
        let journal = CollaborationJournal::new(open_store(&config, Some(bus.clone()))?);
        let services = ReactorServices {
            journal: journal.clone(),
            oracle: Arc::new(LlmContributionOracle::new(chat.clone())),
            state_store: open_state_store(&config)?,
            output_names: config.spec.agents.response_format.clone(),
        };

        let registry = collabpage_agents::default_registry(chat.clone()).context("Failed to register agents")?;
        info!(agents = registry.len(), "Registered agents");

        let host = Arc::new(ReactorHost::new(Arc::new(registry), services));
        let router = Arc::new(EventRouter::new(host.clone(), config.spec.router.readiness_policy()));

        Ok(Self {
            config,
            bus,
            journal,
            chat,
            host,
            router,
        })
    }
}
