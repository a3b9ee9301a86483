// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Journal inspection and raw input submission
//!
//! These commands open the store directly and never start reactors. With the
//! local backend they operate on the same page a running `collab runtime`
//! serves.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use collabpage_core::application::ProcessingJournal;
use collabpage_core::domain::config::{RuntimeConfig, StorageBackend};
use collabpage_core::domain::journal::{FileMetadata, InstanceId};

use crate::bootstrap::open_journal;

fn warn_if_ephemeral(config: &RuntimeConfig) {
    if config.spec.storage.backend == StorageBackend::Memory {
        println!(
            "{}",
            "⚠ Storage backend is 'memory'; nothing persists after this command. Use the 'local' backend."
                .yellow()
        );
    }
}

/// File name under which `path` is stored in the journal.
pub fn input_file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("Input path has no usable file name: {:?}", path))
}

/// Store raw input for an instance, generating an instance id when none is given.
pub async fn submit(
    config_path: Option<PathBuf>,
    file: PathBuf,
    expect: String,
    instance: Option<String>,
) -> Result<()> {
    let config = RuntimeConfig::load_or_default(config_path).context("Failed to load configuration")?;
    warn_if_ephemeral(&config);

    let content = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read input: {:?}", file))?;
    let file_name = input_file_name(&file)?;
    let instance_id = instance.map(InstanceId::new).unwrap_or_else(InstanceId::generate);

    let journal = open_journal(&config)?;
    journal
        .try_put_input(&instance_id, &file_name, &content, &FileMetadata::raw_input(expect))
        .await
        .context("Failed to store input")?;

    println!(
        "{}",
        format!("✓ Submitted {} to instance {}", file_name, instance_id).green()
    );
    Ok(())
}

pub async fn show_journal(config_path: Option<PathBuf>, instance: String) -> Result<()> {
    let config = RuntimeConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let journal = open_journal(&config)?;
    let report = ProcessingJournal::load(&journal, &InstanceId::new(instance.as_str())).await;

    if report.is_empty() {
        println!("{}", format!("No entries for instance {}", instance).yellow());
        return Ok(());
    }
    print!("{}", report);
    Ok(())
}

pub async fn list_instances(config_path: Option<PathBuf>) -> Result<()> {
    let config = RuntimeConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let journal = open_journal(&config)?;
    let instances = journal
        .try_list_instances()
        .await
        .context("Failed to list instances")?;

    if instances.is_empty() {
        println!("{}", "No instances found".yellow());
        return Ok(());
    }

    println!("{} instances found:", instances.len());
    for instance in instances {
        let files = journal.list(&instance).await.len();
        println!("  {} ({} files)", instance.as_str().bold(), files);
    }
    Ok(())
}
