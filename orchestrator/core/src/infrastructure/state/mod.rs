// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Reactor state store adapters.

pub mod file;
pub mod memory;

pub use file::FileReactorStateStore;
pub use memory::InMemoryReactorStateStore;
