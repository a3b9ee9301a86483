// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod host;
pub mod journal;
pub mod reactor;
pub mod registry;
pub mod report;
pub mod router;

pub use host::ReactorHost;
pub use journal::{AgentMatch, CollaborationJournal, JournalError};
pub use reactor::{AgentReactor, ReactorError, ReactorServices};
pub use registry::{CapabilityRegistry, CapabilityRegistryBuilder, RegistryError, Registration};
pub use report::ProcessingJournal;
pub use router::{
    wait_for_readiness, DispatchOutcome, DispatchReport, DropReason, EventRouter, HandlerResult, Readiness,
    ReadinessProbe, RouterStats,
};
