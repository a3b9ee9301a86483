// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `collabpage-core`: Decentralized Agent Choreography
//!
//! Agents collaborate on a shared *instance* by watching storage change events
//! and writing derived artifacts back into the same store. No scheduler decides
//! what runs next: every reactor decides per event whether it should act.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | Journal entries, change events, reactor state, capability descriptors, seams |
//! | [`application`] | Application | `CollaborationJournal`, `CapabilityRegistry`, `AgentReactor`, `ReactorHost`, `EventRouter` |
//! | [`infrastructure`] | Infrastructure | Blob stores, event bus, state stores, chat adapter, contribution oracle |

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
