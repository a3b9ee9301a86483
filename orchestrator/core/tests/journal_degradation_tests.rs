// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

mod common;

use std::sync::Arc;

use collabpage_core::application::{AgentMatch, CollaborationJournal, JournalError, ProcessingJournal};
use collabpage_core::domain::agent::AgentIdentity;
use collabpage_core::domain::journal::{FileMetadata, InstanceId};
use collabpage_core::infrastructure::blob::InMemoryBlobStore;

use common::*;

#[tokio::test]
async fn test_unavailable_store_degrades_every_entry_point() {
    let journal = CollaborationJournal::new(Arc::new(UnavailableBlobStore));
    let instance = InstanceId::new("inst-1");
    let agent = AgentIdentity::new("Lang");
    let metadata = FileMetadata::raw_input("detect language");

    assert_eq!(journal.get(&instance, "in.txt").await, "");
    assert_eq!(journal.get_metadata(&instance, "in.txt").await, FileMetadata::default());
    assert!(!journal.put(&instance, "in.txt", "x", Some(&metadata)).await);
    assert!(!journal.put_input(&instance, "in.txt", "x", &metadata).await);
    assert!(!journal.set_metadata(&instance, "in.txt", &metadata).await);
    assert!(journal.list(&instance).await.is_empty());
    assert!(journal.list_instances().await.is_empty());
    assert!(journal.entries(&instance).await.is_empty());
    assert!(journal.agent_outputs(&instance, &agent, AgentMatch::Other).await.is_empty());
    assert!(ProcessingJournal::load(&journal, &instance).await.is_empty());
}

#[tokio::test]
async fn test_typed_operations_distinguish_miss_from_outage() {
    let instance = InstanceId::new("inst-1");

    let empty = CollaborationJournal::new(Arc::new(InMemoryBlobStore::new(CONTAINER)));
    let miss = empty.try_get(&instance, "missing.txt").await.unwrap_err();
    assert!(miss.is_not_found());

    let offline = CollaborationJournal::new(Arc::new(UnavailableBlobStore));
    let outage = offline.try_get(&instance, "missing.txt").await.unwrap_err();
    assert!(matches!(outage, JournalError::Backend(_)));

    let invalid = empty.try_get(&instance, "nested/name.txt").await.unwrap_err();
    assert!(matches!(invalid, JournalError::InvalidFileName(_)));
}

#[tokio::test]
async fn test_put_exposes_content_before_metadata() {
    let inner = Arc::new(InMemoryBlobStore::new(CONTAINER));
    let gated = Arc::new(GatedMetadataStore::new(inner.clone()));
    let journal = CollaborationJournal::new(gated.clone());
    let reader = CollaborationJournal::new(inner);
    let instance = InstanceId::new("inst-1");
    let agent = AgentIdentity::new("Lang");

    let writer = tokio::spawn({
        let journal = journal.clone();
        let instance = instance.clone();
        let agent = agent.clone();
        async move {
            let metadata = FileMetadata::agent_output(&agent, vec!["in.txt".to_string()]);
            journal.put(&instance, "out.txt", "French", Some(&metadata)).await
        }
    });

    gated.entered.notified().await;
    assert_eq!(reader.get(&instance, "out.txt").await, "French");
    let interim = reader.get_metadata(&instance, "out.txt").await;
    assert!(!interim.is_agent_created);

    gated.release.notify_one();
    assert!(writer.await.unwrap());
    let settled = reader.get_metadata(&instance, "out.txt").await;
    assert!(settled.is_agent_created);
    assert_eq!(settled.agent_name, "Lang");
}

#[tokio::test]
async fn test_put_input_replaces_previous_entry() {
    let store = Arc::new(InMemoryBlobStore::new(CONTAINER));
    let journal = CollaborationJournal::new(store.clone());
    let instance = InstanceId::new("inst-1");

    assert!(journal.put_input(&instance, "in.txt", "first", &FileMetadata::raw_input("a")).await);
    assert!(journal.put_input(&instance, "in.txt", "second", &FileMetadata::raw_input("b")).await);

    assert_eq!(journal.get(&instance, "in.txt").await, "second");
    assert_eq!(
        journal.get_metadata(&instance, "in.txt").await.expected_processing_output,
        "b"
    );
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_concurrent_writers_on_distinct_paths() {
    let journal = CollaborationJournal::new(Arc::new(InMemoryBlobStore::new(CONTAINER)));
    let instance = InstanceId::new("inst-1");

    let writes = (0..16).map(|i| {
        let journal = journal.clone();
        let instance = instance.clone();
        tokio::spawn(async move {
            let agent = AgentIdentity::new(format!("Agent{}", i));
            let metadata = FileMetadata::agent_output(&agent, vec![]);
            journal
                .put(&instance, &format!("out-{}.txt", i), &i.to_string(), Some(&metadata))
                .await
        })
    });
    for write in futures::future::join_all(writes).await {
        assert!(write.unwrap());
    }

    let entries = journal.entries(&instance).await;
    assert_eq!(entries.len(), 16);
    assert!(entries.iter().all(|e| e.metadata.is_agent_created));
    let others = journal
        .agent_outputs(&instance, &AgentIdentity::new("Agent0"), AgentMatch::Other)
        .await;
    assert_eq!(others.len(), 15);
}
