// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use collabpage_agents::{default_registry, language, sentiment, summarizer};
use collabpage_core::application::{
    AgentMatch, CollaborationJournal, EventRouter, ProcessingJournal, ReactorHost, ReactorServices,
};
use collabpage_core::domain::agent::AgentIdentity;
use collabpage_core::domain::config::ReadinessPolicy;
use collabpage_core::domain::journal::{FileMetadata, InstanceId, OutputNameTemplate};
use collabpage_core::domain::llm::{ChatCompletion, LLMError};
use collabpage_core::infrastructure::blob::InMemoryBlobStore;
use collabpage_core::infrastructure::event_bus::{EventBus, EventReceiver};
use collabpage_core::infrastructure::state::InMemoryReactorStateStore;
use collabpage_core::infrastructure::LlmContributionOracle;

/// Deterministic stand-in for the chat model.
#[derive(Default)]
struct ScriptedModel {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatCompletion for ScriptedModel {
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, LLMError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.starts_with("Should the task be performed") {
            let wanted = (system_prompt.contains(language::PURPOSE) && prompt.contains("language"))
                || (system_prompt.contains(sentiment::PURPOSE) && prompt.contains("sentiment"));
            return Ok(format!("```json\n{{\"processing\": {}}}\n```", wanted));
        }
        if prompt.starts_with("Detect the language of:") {
            return Ok("French".to_string());
        }
        if prompt.starts_with("Detect the sentiment of:") {
            return Ok("positive".to_string());
        }
        if let Some(input) = prompt.strip_prefix("Transform the input to a valid JSON object: ") {
            let mut summary = serde_json::Map::new();
            if input.contains("French") {
                summary.insert("language".into(), "fr".into());
            }
            if input.contains("positive") {
                summary.insert("sentiment".into(), "positive".into());
            }
            return Ok(serde_json::Value::Object(summary).to_string());
        }
        Err(LLMError::InvalidInput(format!("unexpected prompt: {}", prompt)))
    }
}

struct Runtime {
    journal: CollaborationJournal,
    bus: EventBus,
    router: EventRouter,
}

fn runtime() -> Runtime {
    let chat: Arc<dyn ChatCompletion> = Arc::new(ScriptedModel::default());
    let bus = EventBus::new(64);
    let store = Arc::new(InMemoryBlobStore::new("collabpage").with_event_bus(bus.clone()));
    let journal = CollaborationJournal::new(store);
    let services = ReactorServices {
        journal: journal.clone(),
        oracle: Arc::new(LlmContributionOracle::new(chat.clone())),
        state_store: Arc::new(InMemoryReactorStateStore::new()),
        output_names: OutputNameTemplate::default(),
    };
    let registry = default_registry(chat).unwrap();
    let host = Arc::new(ReactorHost::new(Arc::new(registry), services));
    let router = EventRouter::new(
        host,
        ReadinessPolicy {
            attempts: 1,
            interval: Duration::from_millis(1),
        },
    );
    Runtime { journal, bus, router }
}

/// Route every queued notification; returns the bodies handled.
async fn drain(router: &EventRouter, feed: &mut EventReceiver) -> Vec<String> {
    let mut handled = Vec::new();
    while let Ok(notification) = feed.try_recv() {
        router.handle_message(&notification.body).await;
        handled.push(notification.body);
    }
    handled
}

#[tokio::test]
async fn test_language_and_sentiment_are_merged_once() {
    let rt = runtime();
    let mut feed = rt.bus.subscribe();
    let instance = InstanceId::new("demo");

    assert!(
        rt.journal
            .put_input(
                &instance,
                "input.txt",
                "Bonjour, ça va bien!",
                &FileMetadata::raw_input("Detect the language and the sentiment of the text"),
            )
            .await
    );
    drain(&rt.router, &mut feed).await;

    let summaries = rt
        .journal
        .agent_outputs(&instance, &AgentIdentity::new(summarizer::NAME), AgentMatch::Same)
        .await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].content, r#"{"language":"fr","sentiment":"positive"}"#);
    assert_eq!(summaries[0].metadata.input_files.len(), 2);

    let report = ProcessingJournal::load(&rt.journal, &instance).await;
    assert_eq!(report.entries.len(), 4);
    assert_eq!(report.entries[0].file_name, "input.txt");
    assert!(report.to_string().contains("File Content: Bonjour, ça va bien!"));
}

#[tokio::test]
async fn test_only_approved_detectors_contribute() {
    let rt = runtime();
    let mut feed = rt.bus.subscribe();
    let instance = InstanceId::new("demo");

    rt.journal
        .put_input(
            &instance,
            "input.txt",
            "Bonjour",
            &FileMetadata::raw_input("Tell me which language this is"),
        )
        .await;
    drain(&rt.router, &mut feed).await;

    let sentiment_outputs = rt
        .journal
        .agent_outputs(&instance, &AgentIdentity::new(sentiment::NAME), AgentMatch::Same)
        .await;
    assert!(sentiment_outputs.is_empty());

    let summaries = rt
        .journal
        .agent_outputs(&instance, &AgentIdentity::new(summarizer::NAME), AgentMatch::Same)
        .await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].content, r#"{"language":"fr"}"#);
}

#[tokio::test]
async fn test_redelivery_stores_nothing_new() {
    let rt = runtime();
    let mut feed = rt.bus.subscribe();
    let instance = InstanceId::new("demo");

    rt.journal
        .put_input(
            &instance,
            "input.txt",
            "Bonjour, ça va bien!",
            &FileMetadata::raw_input("Detect language and sentiment"),
        )
        .await;
    let delivered = drain(&rt.router, &mut feed).await;
    assert_eq!(delivered.len(), 4);
    let files = rt.journal.list(&instance).await;

    for body in delivered {
        rt.bus.publish_raw(body);
    }
    let redelivered = drain(&rt.router, &mut feed).await;

    assert_eq!(redelivered.len(), 4);
    assert_eq!(rt.journal.list(&instance).await, files);
}
