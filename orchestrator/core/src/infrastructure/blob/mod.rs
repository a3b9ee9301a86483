// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Blob store adapters for the collaboration container.
//!
//! Both adapters optionally publish a change notification to an
//! [`EventBus`](crate::infrastructure::event_bus::EventBus) on every upload
//! and delete, standing in for the storage account's change feed.

pub mod local;
pub mod memory;

pub use local::LocalBlobStore;
pub use memory::InMemoryBlobStore;
