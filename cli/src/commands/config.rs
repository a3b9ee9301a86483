// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use collabpage_core::domain::config::{LlmConfig, LlmProviderType, RuntimeConfig};
use collabpage_core::domain::llm::ChatOptions;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./collab-config.yaml)
        #[arg(short, long, default_value = "./collab-config.yaml")]
        output: PathBuf,

        /// Include a sample Azure OpenAI section
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, examples } => generate(output, examples),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = RuntimeConfig::load_or_default(config_override.clone()).context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. COLLAB_CONFIG_PATH: {}",
            std::env::var("COLLAB_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./collab-config.yaml");
        println!("  4. ~/.collab/config.yaml");
        println!("  5. /etc/collab/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    let storage = &config.spec.storage;
    println!("{}", "Storage:".bold());
    println!("  Backend: {:?}", storage.backend);
    println!("  Path: {}", storage.path.display());
    println!("  Container: {}", storage.container);
    println!();

    let state = &config.spec.state;
    println!("{}", "Reactor State:".bold());
    println!("  Backend: {:?}", state.backend);
    println!("  Directory: {}", state.dir.display());
    println!();

    println!("{}", "Agents:".bold());
    println!("  Response format: {}", config.spec.agents.response_format);
    println!();

    println!("{}", "LLM:".bold());
    match &config.spec.llm {
        Some(llm) => {
            println!("  Type: {:?}", llm.provider_type);
            println!("  Endpoint: {}", llm.endpoint);
            println!("  Model: {}", llm.model);
            let key = if llm.api_key.is_some() { "(set)" } else { "(not set)" };
            println!("  API key: {}", key.dimmed());
        }
        None => println!("  {}", "(not configured)".yellow()),
    }
    println!();

    let router = &config.spec.router;
    println!("{}", "Router:".bold());
    println!(
        "  Readiness: {} attempts, {} ms apart",
        router.readiness_attempts, router.readiness_interval_ms
    );
    println!("  Bus capacity: {}", router.bus_capacity);
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = RuntimeConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let mut config = RuntimeConfig::default();
    if with_examples {
        config.spec.llm = Some(LlmConfig {
            provider_type: LlmProviderType::AzureOpenAI,
            endpoint: "https://my-resource.openai.azure.com".to_string(),
            api_key: Some("env:OA_AOAI_APIKEY".to_string()),
            model: "gpt-4o".to_string(),
            options: ChatOptions::default(),
        });
    }

    config
        .to_yaml_file(&output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_validates() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("collab-config.yaml");
        generate(output.clone(), true).unwrap();

        let config = RuntimeConfig::from_yaml_file(&output).unwrap();
        config.validate().unwrap();
        assert_eq!(config.spec.llm.unwrap().provider_type, LlmProviderType::AzureOpenAI);
    }
}
