// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Event Router Application Service
//!
//! Consumes change notifications, enriches each event with the journal
//! metadata of the file it names, and fans it out to the reactor of every
//! registered agent for that instance.
//!
//! - Events from outside the collaboration container are rejected
//! - Events without an instance are dropped
//! - Reactors for one event run concurrently; their handlers run in order
//! - A handler failure is logged and never reaches the caller or siblings
//!
//! Before the first dispatch the router waits a bounded time for the host to
//! become ready. If it never does the router logs a warning and dispatches
//! anyway, then checks again before the next event.

use async_trait::async_trait;
use futures::future::join_all;
use metrics::counter;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::host::ReactorHost;
use crate::application::registry::Registration;
use crate::domain::agent::{AgentIdentity, HandlerKind};
use crate::domain::config::ReadinessPolicy;
use crate::domain::events::ChangeEvent;
use crate::domain::journal::InstanceId;
use crate::domain::reactor::Reaction;
use crate::infrastructure::event_bus::{EventBusError, EventReceiver};

/// Whether the reactor-hosting runtime can take work.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn is_ready(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready { attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Poll `probe` up to `policy.attempts` times, sleeping between attempts.
pub async fn wait_for_readiness(probe: &dyn ReadinessProbe, policy: ReadinessPolicy) -> Readiness {
    for attempt in 1..=policy.attempts {
        if probe.is_ready().await {
            return Readiness::Ready { attempts: attempt };
        }
        debug!(attempt, max_attempts = policy.attempts, "Reactor runtime not ready yet");
        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Readiness::Exhausted {
        attempts: policy.attempts,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    ForeignSource,
    NoInstance,
}

impl DropReason {
    fn as_str(&self) -> &'static str {
        match self {
            DropReason::ForeignSource => "foreign_source",
            DropReason::NoInstance => "no_instance",
        }
    }
}

#[derive(Debug)]
pub struct HandlerResult {
    pub agent: AgentIdentity,
    pub handler: HandlerKind,
    /// Error rendered as text; failures stop at the dispatch boundary.
    pub outcome: Result<Reaction, String>,
}

#[derive(Debug)]
pub struct DispatchReport {
    pub event: ChangeEvent,
    pub results: Vec<HandlerResult>,
}

impl DispatchReport {
    pub fn produced(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().and_then(Reaction::output_file))
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_err()).count()
    }

    pub fn result_for(&self, agent: &str) -> Option<&HandlerResult> {
        self.results.iter().find(|r| r.agent == agent)
    }
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Rejected(DropReason),
    Dispatched(DispatchReport),
}

impl DispatchOutcome {
    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            DispatchOutcome::Dispatched(report) => Some(report),
            DispatchOutcome::Rejected(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub received: u64,
    pub dispatched: u64,
    pub dropped: u64,
}

pub struct EventRouter {
    host: Arc<ReactorHost>,
    probe: Arc<dyn ReadinessProbe>,
    policy: ReadinessPolicy,
    ready: AtomicBool,
}

impl EventRouter {
    /// Router probing the host itself for readiness.
    pub fn new(host: Arc<ReactorHost>, policy: ReadinessPolicy) -> Self {
        let probe: Arc<dyn ReadinessProbe> = host.clone();
        Self::with_probe(host, probe, policy)
    }

    pub fn with_probe(host: Arc<ReactorHost>, probe: Arc<dyn ReadinessProbe>, policy: ReadinessPolicy) -> Self {
        Self {
            host,
            probe,
            policy,
            ready: AtomicBool::new(false),
        }
    }

    pub fn host(&self) -> &Arc<ReactorHost> {
        &self.host
    }

    /// Route one raw transport message body.
    pub async fn handle_message(&self, body: &str) -> DispatchOutcome {
        counter!("collab_events_received_total").increment(1);
        self.route(ChangeEvent::from_json(body)).await
    }

    pub async fn route(&self, mut event: ChangeEvent) -> DispatchOutcome {
        let container = self.host.services().journal.container().to_string();
        if !belongs_to_container(&event.source_url, &container) {
            return self.drop_event(&event, DropReason::ForeignSource);
        }
        if !event.has_instance() {
            return self.drop_event(&event, DropReason::NoInstance);
        }

        self.ensure_ready().await;

        let metadata = self
            .host
            .services()
            .journal
            .get_metadata(&event.instance_id, &event.file_name)
            .await;
        event.enrich(&metadata);

        DispatchOutcome::Dispatched(self.dispatch(event).await)
    }

    /// Fan an enriched event out to every registered agent's reactor.
    pub async fn dispatch(&self, event: ChangeEvent) -> DispatchReport {
        let host = &self.host;
        let event_ref = &event;
        let per_reactor = host
            .registry()
            .iter()
            .map(|registration| Self::dispatch_to(host, registration, &event_ref.instance_id, event_ref));
        let results = join_all(per_reactor).await.into_iter().flatten().collect();

        DispatchReport { event, results }
    }

    async fn dispatch_to(
        host: &ReactorHost,
        registration: &Registration,
        instance_id: &InstanceId,
        event: &ChangeEvent,
    ) -> Vec<HandlerResult> {
        let reactor = host.reactor(registration, instance_id);
        let agent = registration.descriptor.identity.clone();
        let mut results = Vec::with_capacity(registration.descriptor.handlers.len());

        for &handler in &registration.descriptor.handlers {
            counter!("collab_handler_invocations_total", "agent" => agent.to_string()).increment(1);
            let outcome = match reactor.invoke(handler, event).await {
                Ok(reaction) => Ok(reaction),
                Err(e) => {
                    counter!("collab_handler_failures_total", "agent" => agent.to_string()).increment(1);
                    error!(
                        agent = %agent,
                        handler = %handler,
                        instance_id = %instance_id,
                        file_name = %event.file_name,
                        error = %e,
                        "Reactor handler failed"
                    );
                    Err(e.to_string())
                }
            };
            results.push(HandlerResult {
                agent: agent.clone(),
                handler,
                outcome,
            });
        }
        results
    }

    async fn ensure_ready(&self) {
        if self.ready.load(Ordering::Acquire) {
            return;
        }
        match wait_for_readiness(self.probe.as_ref(), self.policy).await {
            Readiness::Ready { attempts } => {
                debug!(attempts, "Reactor runtime ready");
                self.ready.store(true, Ordering::Release);
            }
            Readiness::Exhausted { attempts } => {
                warn!(
                    attempts,
                    "Reactor runtime still not ready after all readiness attempts, dispatching anyway"
                );
            }
        }
    }

    fn drop_event(&self, event: &ChangeEvent, reason: DropReason) -> DispatchOutcome {
        counter!("collab_events_dropped_total", "reason" => reason.as_str()).increment(1);
        debug!(
            subject = %event.subject,
            source_url = %event.source_url,
            reason = reason.as_str(),
            "Dropping change event"
        );
        DispatchOutcome::Rejected(reason)
    }

    /// Process messages one at a time until the bus closes or `shutdown` fires.
    pub async fn run<F>(&self, mut receiver: EventReceiver, shutdown: F) -> RouterStats
    where
        F: Future<Output = ()>,
    {
        info!(container = %self.host.services().journal.container(), "Event router started");
        let mut stats = RouterStats::default();
        tokio::pin!(shutdown);

        loop {
            let notification = tokio::select! {
                _ = &mut shutdown => {
                    info!("Event router shutting down");
                    break;
                }
                received = receiver.recv() => received,
            };

            match notification {
                Ok(notification) => {
                    stats.received += 1;
                    match self.handle_message(&notification.body).await {
                        DispatchOutcome::Dispatched(report) => {
                            stats.dispatched += 1;
                            debug!(
                                file_name = %report.event.file_name,
                                produced = report.produced().len(),
                                failures = report.failures(),
                                "Event dispatched"
                            );
                        }
                        DispatchOutcome::Rejected(_) => stats.dropped += 1,
                    }
                }
                Err(EventBusError::Lagged(n)) => {
                    warn!(skipped = n, "Event router lagged behind the change feed");
                }
                Err(EventBusError::Closed) => {
                    info!("Change feed closed, event router stopping");
                    break;
                }
                Err(EventBusError::Empty) => {}
            }
        }

        info!(
            received = stats.received,
            dispatched = stats.dispatched,
            dropped = stats.dropped,
            "Event router stopped"
        );
        stats
    }
}

/// Whether a blob URL points into `container`.
fn belongs_to_container(source_url: &str, container: &str) -> bool {
    !container.is_empty() && source_url.contains(&format!("/{}/", container))
}
