// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod blob;
pub mod event_bus;
pub mod llm;
pub mod oracle;
pub mod state;

pub use event_bus::{ChangeNotification, EventBus, EventBusError, EventReceiver};
pub use oracle::LlmContributionOracle;
