// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer
//!
//! Pure types and the seams (traits) the application layer depends on.
//! Nothing in here performs I/O.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`agent`] | `AgentIdentity`, `CapabilityDescriptor`, `AgentBehavior` |
//! | [`journal`] | `InstanceId`, `FileMetadata`, `JournalEntry`, `OutputNameTemplate` |
//! | [`events`] | `ChangeEvent`, `ChangeEventEnvelope`, `DedupKey` |
//! | [`reactor`] | `ReactorKey`, `ReactorState`, `Reaction` |
//! | [`storage`] | `BlobStore` |
//! | [`state_store`] | `ReactorStateStore` |
//! | [`llm`] | `ChatCompletion` |
//! | [`oracle`] | `ContributionOracle` |
//! | [`config`] | `RuntimeConfig` |

pub mod agent;
pub mod config;
pub mod events;
pub mod journal;
pub mod llm;
pub mod oracle;
pub mod reactor;
pub mod state_store;
pub mod storage;
