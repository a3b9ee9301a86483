// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use collabpage_core::application::{
    CapabilityRegistry, CollaborationJournal, DispatchOutcome, EventRouter, ReactorHost, ReactorServices,
};
use collabpage_core::domain::agent::{AgentBehavior, CapabilityDescriptor, TransformError};
use collabpage_core::domain::config::ReadinessPolicy;
use collabpage_core::domain::events::{ChangeEvent, ChangeEventEnvelope, ChangeKind};
use collabpage_core::domain::journal::{FileMetadata, InstanceId, OutputNameTemplate};
use collabpage_core::domain::llm::LLMError;
use collabpage_core::domain::oracle::{ContributionOracle, OracleError};
use collabpage_core::domain::storage::{BlobMetadata, BlobProperties, BlobStore, StorageError};
use collabpage_core::infrastructure::blob::InMemoryBlobStore;
use collabpage_core::infrastructure::event_bus::{EventBus, EventBusError, EventReceiver};
use collabpage_core::infrastructure::state::InMemoryReactorStateStore;

pub const CONTAINER: &str = "collabpage";
pub const LANGUAGE_PURPOSE: &str = "Detect language in provided text";
pub const SENTIMENT_PURPOSE: &str = "Detect sentiment in provided text";

/// Oracle approving a fixed set of purposes.
pub struct ScriptedOracle {
    approved: HashSet<String>,
    fail: bool,
    pub calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn approving(purposes: &[&str]) -> Self {
        Self {
            approved: purposes.iter().map(|p| p.to_string()).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            approved: HashSet::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContributionOracle for ScriptedOracle {
    async fn should_contribute(&self, _expected: &str, agent_purpose: &str) -> Result<bool, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(OracleError::Llm(LLMError::Network("oracle offline".into())));
        }
        Ok(self.approved.contains(agent_purpose))
    }
}

/// Agent answering `"{label}({input})"`.
pub struct LabelAgent {
    descriptor: CapabilityDescriptor,
    label: String,
    pub transforms: AtomicUsize,
}

impl LabelAgent {
    pub fn primary(name: &str, purpose: &str, label: &str) -> Arc<Self> {
        Arc::new(Self {
            descriptor: CapabilityDescriptor::primary(name, purpose),
            label: label.to_string(),
            transforms: AtomicUsize::new(0),
        })
    }

    pub fn derived(name: &str, label: &str) -> Arc<Self> {
        Arc::new(Self {
            descriptor: CapabilityDescriptor::derived(name, "Combine agent outputs"),
            label: label.to_string(),
            transforms: AtomicUsize::new(0),
        })
    }

    pub fn transform_count(&self) -> usize {
        self.transforms.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentBehavior for LabelAgent {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn transform(&self, input: &str) -> Result<String, TransformError> {
        self.transforms.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}({})", self.label, input))
    }
}

/// Agent whose transform always fails.
pub struct BrokenAgent(CapabilityDescriptor);

impl BrokenAgent {
    pub fn primary(name: &str, purpose: &str) -> Arc<Self> {
        Arc::new(Self(CapabilityDescriptor::primary(name, purpose)))
    }
}

#[async_trait]
impl AgentBehavior for BrokenAgent {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.0
    }

    async fn transform(&self, _input: &str) -> Result<String, TransformError> {
        Err(TransformError::Failed("model crashed".into()))
    }
}

/// Blob store whose every operation fails.
pub struct UnavailableBlobStore;

#[async_trait]
impl BlobStore for UnavailableBlobStore {
    fn container(&self) -> &str {
        CONTAINER
    }

    async fn upload(&self, _: &str, _: &str, _: Option<BlobMetadata>, _: bool) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("offline".into()))
    }

    async fn download(&self, _: &str) -> Result<String, StorageError> {
        Err(StorageError::Unavailable("offline".into()))
    }

    async fn delete_if_exists(&self, _: &str) -> Result<bool, StorageError> {
        Err(StorageError::Unavailable("offline".into()))
    }

    async fn properties(&self, _: &str) -> Result<BlobProperties, StorageError> {
        Err(StorageError::Unavailable("offline".into()))
    }

    async fn set_metadata(&self, _: &str, _: BlobMetadata) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("offline".into()))
    }

    async fn list(&self, _: Option<&str>) -> Result<Vec<String>, StorageError> {
        Err(StorageError::Unavailable("offline".into()))
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("offline".into()))
    }
}

/// Wraps a store and pauses `set_metadata` until released.
pub struct GatedMetadataStore {
    inner: Arc<InMemoryBlobStore>,
    pub entered: tokio::sync::Notify,
    pub release: tokio::sync::Notify,
}

impl GatedMetadataStore {
    pub fn new(inner: Arc<InMemoryBlobStore>) -> Self {
        Self {
            inner,
            entered: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        }
    }
}

#[async_trait]
impl BlobStore for GatedMetadataStore {
    fn container(&self) -> &str {
        self.inner.container()
    }

    async fn upload(
        &self,
        path: &str,
        content: &str,
        metadata: Option<BlobMetadata>,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        self.inner.upload(path, content, metadata, overwrite).await
    }

    async fn download(&self, path: &str) -> Result<String, StorageError> {
        self.inner.download(path).await
    }

    async fn delete_if_exists(&self, path: &str) -> Result<bool, StorageError> {
        self.inner.delete_if_exists(path).await
    }

    async fn properties(&self, path: &str) -> Result<BlobProperties, StorageError> {
        self.inner.properties(path).await
    }

    async fn set_metadata(&self, path: &str, metadata: BlobMetadata) -> Result<(), StorageError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.set_metadata(path, metadata).await
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        self.inner.list(prefix).await
    }
}

/// Full in-memory stack wired to an event bus.
pub struct Harness {
    pub store: Arc<InMemoryBlobStore>,
    pub bus: EventBus,
    pub journal: CollaborationJournal,
    pub state_store: Arc<InMemoryReactorStateStore>,
    pub oracle: Arc<ScriptedOracle>,
    pub host: Arc<ReactorHost>,
    pub router: EventRouter,
}

pub fn fast_readiness() -> ReadinessPolicy {
    ReadinessPolicy {
        attempts: 2,
        interval: Duration::from_millis(1),
    }
}

impl Harness {
    pub fn new(agents: Vec<Arc<dyn AgentBehavior>>, oracle: ScriptedOracle) -> Self {
        Self::with_template(agents, oracle, OutputNameTemplate::default())
    }

    pub fn with_template(
        agents: Vec<Arc<dyn AgentBehavior>>,
        oracle: ScriptedOracle,
        output_names: OutputNameTemplate,
    ) -> Self {
        let bus = EventBus::new(256);
        let store = Arc::new(InMemoryBlobStore::new(CONTAINER).with_event_bus(bus.clone()));
        let journal = CollaborationJournal::new(store.clone());
        let state_store = Arc::new(InMemoryReactorStateStore::new());
        let oracle = Arc::new(oracle);

        let registry = agents
            .into_iter()
            .fold(CapabilityRegistry::builder(), |builder, agent| builder.register(agent))
            .build()
            .expect("registry");

        let services = ReactorServices {
            journal: journal.clone(),
            oracle: oracle.clone(),
            state_store: state_store.clone(),
            output_names,
        };
        let host = Arc::new(ReactorHost::new(Arc::new(registry), services));
        let router = EventRouter::new(host.clone(), fast_readiness());

        Self {
            store,
            bus,
            journal,
            state_store,
            oracle,
            host,
            router,
        }
    }

    pub async fn submit(&self, instance: &InstanceId, file_name: &str, content: &str, expected: &str) {
        assert!(
            self.journal
                .put_input(instance, file_name, content, &FileMetadata::raw_input(expected))
                .await
        );
    }

    /// Route queued notifications until the feed is drained.
    pub async fn pump(&self, receiver: &mut EventReceiver) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        loop {
            match receiver.try_recv() {
                Ok(notification) => outcomes.push(self.router.handle_message(&notification.body).await),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        outcomes
    }
}

/// A `Created` event for `{instance}/{file}` in the collaboration container.
pub fn created_event(instance: &str, file_name: &str) -> ChangeEvent {
    ChangeEvent::from_envelope(ChangeEventEnvelope::for_blob(
        ChangeKind::Created,
        CONTAINER,
        &format!("{}/{}", instance, file_name),
    ))
}
