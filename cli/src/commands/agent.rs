// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use collabpage_core::domain::agent::{AgentIdentity, ReactorRole};
use collabpage_core::domain::config::RuntimeConfig;

use crate::bootstrap::build_chat;

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List built-in agents
    List,

    /// Run one agent's transform on a file, outside the collaboration
    Call {
        /// Agent name (e.g. LanguageDetectionAgent)
        #[arg(value_name = "AGENT")]
        name: String,

        /// Input file
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },
}

pub async fn handle_command(command: AgentCommand, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        AgentCommand::List => list_agents(),
        AgentCommand::Call { name, file } => call_agent(config_path, name, file).await,
    }
}

fn list_agents() -> Result<()> {
    let descriptors = collabpage_agents::builtin_descriptors();
    println!("{} agents registered:", descriptors.len());
    println!("{:<26} {:<8} {}", "NAME", "ROLE", "PURPOSE");

    for descriptor in descriptors {
        let role = match descriptor.role {
            ReactorRole::Primary => "primary",
            ReactorRole::Derived => "derived",
        };
        println!("{:<26} {:<8} {}", descriptor.identity.as_str().bold(), role, descriptor.purpose);
    }

    Ok(())
}

async fn call_agent(config_path: Option<PathBuf>, name: String, file: PathBuf) -> Result<()> {
    let config = RuntimeConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let input = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read input: {:?}", file))?;

    let registry = collabpage_agents::default_registry(build_chat(&config)?)?;
    let registration = registry
        .get(&AgentIdentity::new(name.as_str()))
        .with_context(|| format!("Agent '{}' not found. Run 'collab agent list'.", name))?;

    println!("{}", format!("Calling {}...", name).dimmed());
    let response = registration
        .behavior
        .transform(&input)
        .await
        .with_context(|| format!("Agent '{}' failed", name))?;
    println!("{}", response);

    Ok(())
}
