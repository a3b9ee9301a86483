// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

mod common;

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use collabpage_core::application::{
    AgentMatch, DispatchOutcome, DropReason, EventRouter, ReadinessProbe,
};
use collabpage_core::domain::agent::{AgentBehavior, AgentIdentity};
use collabpage_core::domain::config::ReadinessPolicy;
use collabpage_core::domain::events::{ChangeEventEnvelope, ChangeKind};
use collabpage_core::domain::journal::InstanceId;
use collabpage_core::domain::reactor::Reaction;

use common::*;

struct NeverReady(AtomicU32);

#[async_trait]
impl ReadinessProbe for NeverReady {
    async fn is_ready(&self) -> bool {
        self.0.fetch_add(1, Ordering::SeqCst);
        false
    }
}

fn language_and_sentiment() -> (Vec<Arc<dyn AgentBehavior>>, ScriptedOracle) {
    let agents: Vec<Arc<dyn AgentBehavior>> = vec![
        LabelAgent::primary("Lang", LANGUAGE_PURPOSE, "lang"),
        LabelAgent::primary("Sentiment", SENTIMENT_PURPOSE, "sent"),
        LabelAgent::derived("Summarizer", "sum"),
    ];
    (agents, ScriptedOracle::approving(&[LANGUAGE_PURPOSE, SENTIMENT_PURPOSE]))
}

#[tokio::test]
async fn test_foreign_container_is_rejected() {
    let (agents, oracle) = language_and_sentiment();
    let h = Harness::new(agents, oracle);
    let envelope = ChangeEventEnvelope::for_blob(ChangeKind::Created, "elsewhere", "inst-1/in.txt");
    let body = serde_json::to_string(&envelope).unwrap();

    let outcome = h.router.handle_message(&body).await;
    assert!(matches!(outcome, DispatchOutcome::Rejected(DropReason::ForeignSource)));
    assert_eq!(h.host.active_reactors(), 0);
}

#[tokio::test]
async fn test_root_level_blob_is_dropped() {
    let (agents, oracle) = language_and_sentiment();
    let h = Harness::new(agents, oracle);
    let mut envelope = ChangeEventEnvelope::for_blob(ChangeKind::Created, CONTAINER, "in.txt");
    envelope.subject = format!("/blobServices/default/containers/{}/blobs/in.txt", CONTAINER);
    let body = serde_json::to_string(&envelope).unwrap();

    let outcome = h.router.handle_message(&body).await;
    assert!(matches!(outcome, DispatchOutcome::Rejected(DropReason::NoInstance)));
    assert_eq!(h.host.active_reactors(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_dropped() {
    let (agents, oracle) = language_and_sentiment();
    let h = Harness::new(agents, oracle);

    let outcome = h.router.handle_message("{not json").await;
    assert!(matches!(outcome, DispatchOutcome::Rejected(_)));
    assert_eq!(h.host.active_reactors(), 0);
}

#[tokio::test]
async fn test_deleted_event_reaches_reactors_but_is_skipped() {
    let (agents, oracle) = language_and_sentiment();
    let h = Harness::new(agents, oracle);
    let envelope = ChangeEventEnvelope::for_blob(ChangeKind::Deleted, CONTAINER, "inst-1/in.txt");
    let body = serde_json::to_string(&envelope).unwrap();

    let outcome = h.router.handle_message(&body).await;
    let report = outcome.report().expect("dispatched");
    assert_eq!(report.results.len(), 3);
    assert!(report.produced().is_empty());
    assert_eq!(report.failures(), 0);
}

#[tokio::test]
async fn test_handler_failure_is_isolated() {
    let lang = LabelAgent::primary("Lang", LANGUAGE_PURPOSE, "lang");
    let agents: Vec<Arc<dyn AgentBehavior>> = vec![BrokenAgent::primary("Broken", LANGUAGE_PURPOSE), lang];
    let h = Harness::new(agents, ScriptedOracle::approving(&[LANGUAGE_PURPOSE]));
    let instance = InstanceId::new("inst-1");
    h.submit(&instance, "in.txt", "Bonjour", "detect language").await;

    let outcome = h.router.route(created_event("inst-1", "in.txt")).await;
    let report = outcome.report().expect("dispatched");

    assert_eq!(report.failures(), 1);
    assert!(report.result_for("Broken").unwrap().outcome.is_err());
    assert!(matches!(
        report.result_for("Lang").unwrap().outcome,
        Ok(Reaction::Produced { .. })
    ));

    // The failed turn left no trace, so a redelivery is attempted again
    let retried = h.router.route(created_event("inst-1", "in.txt")).await;
    assert_eq!(retried.report().unwrap().failures(), 1);
}

#[tokio::test]
async fn test_collaboration_reaches_fixed_point() {
    let (agents, oracle) = language_and_sentiment();
    let h = Harness::new(agents, oracle);
    let instance = InstanceId::new("inst-1");
    let mut feed = h.bus.subscribe();

    h.submit(&instance, "in.txt", "Bonjour", "detect language and sentiment").await;
    let outcomes = h.pump(&mut feed).await;

    // Raw input, two primary outputs, one summary
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|o| o.report().is_some()));
    assert_eq!(h.journal.list(&instance).await.len(), 4);

    let summaries = h
        .journal
        .agent_outputs(&instance, &AgentIdentity::new("Summarizer"), AgentMatch::Same)
        .await;
    assert_eq!(summaries.len(), 1);

    // Nothing left to react to
    assert!(h.pump(&mut feed).await.is_empty());
}

#[tokio::test]
async fn test_instances_are_independent() {
    let (agents, oracle) = language_and_sentiment();
    let h = Harness::new(agents, oracle);
    let mut feed = h.bus.subscribe();

    h.submit(&InstanceId::new("inst-a"), "in.txt", "Bonjour", "detect language").await;
    h.submit(&InstanceId::new("inst-b"), "in.txt", "Hello", "detect language").await;
    h.pump(&mut feed).await;

    for instance in ["inst-a", "inst-b"] {
        let summaries = h
            .journal
            .agent_outputs(&InstanceId::new(instance), &AgentIdentity::new("Summarizer"), AgentMatch::Same)
            .await;
        assert_eq!(summaries.len(), 1, "instance {}", instance);
    }
    assert_eq!(h.host.active_reactors(), 6);
}

#[tokio::test]
async fn test_dispatches_even_when_never_ready() {
    let (agents, oracle) = language_and_sentiment();
    let h = Harness::new(agents, oracle);
    let probe = Arc::new(NeverReady(AtomicU32::new(0)));
    let router = EventRouter::with_probe(
        h.host.clone(),
        probe.clone(),
        ReadinessPolicy {
            attempts: 3,
            interval: Duration::from_millis(1),
        },
    );
    let instance = InstanceId::new("inst-1");
    h.submit(&instance, "in.txt", "Bonjour", "detect language").await;

    let outcome = router.route(created_event("inst-1", "in.txt")).await;
    assert_eq!(outcome.report().unwrap().produced().len(), 2);
    assert_eq!(probe.0.load(Ordering::SeqCst), 3);

    // Not latched: the next event checks again
    router.route(created_event("inst-1", "in.txt")).await;
    assert_eq!(probe.0.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_run_loop_processes_feed_until_shutdown() {
    let (agents, oracle) = language_and_sentiment();
    let h = Harness::new(agents, oracle);
    let instance = InstanceId::new("inst-1");

    let router = Arc::new(EventRouter::new(h.host.clone(), fast_readiness()));
    let feed = h.bus.subscribe();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn({
        let router = router.clone();
        async move {
            router
                .run(feed, async {
                    let _ = stopped.await;
                })
                .await
        }
    });

    h.submit(&instance, "in.txt", "Bonjour", "detect language and sentiment").await;

    let summarizer = AgentIdentity::new("Summarizer");
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while h
        .journal
        .agent_outputs(&instance, &summarizer, AgentMatch::Same)
        .await
        .is_empty()
    {
        assert!(tokio::time::Instant::now() < deadline, "no summary produced");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let _ = stop.send(());
    let stats = task.await.unwrap();
    assert!(stats.dispatched >= 2);
    assert_eq!(stats.dropped, 0);
}
