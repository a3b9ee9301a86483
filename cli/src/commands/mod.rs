// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the collab CLI

pub mod agent;
pub mod config;
pub mod journal;
pub mod run;
pub mod runtime;

pub use self::agent::AgentCommand;
pub use self::config::ConfigCommand;
pub use self::run::RunArgs;
