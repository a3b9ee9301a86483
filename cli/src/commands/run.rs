// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! One-shot collaboration: start the runtime in-process, submit a file, print
//! summaries as they appear and, once the page has been quiet for
//! `--idle-secs`, print the processing journal.

use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};

use collabpage_core::application::{AgentMatch, CollaborationJournal, ProcessingJournal};
use collabpage_core::domain::agent::AgentIdentity;
use collabpage_core::domain::config::RuntimeConfig;
use collabpage_core::domain::journal::{FileMetadata, InstanceId};
use collabpage_core::infrastructure::EventBusError;

use crate::bootstrap::Runtime;
use crate::commands::journal::input_file_name;

pub struct RunArgs {
    pub file: PathBuf,
    pub expect: String,
    pub instance: Option<String>,
    pub idle_secs: u64,
}

pub async fn handle_command(config_path: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let config = RuntimeConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let runtime = Runtime::build(config)?;

    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read input: {:?}", args.file))?;
    let file_name = input_file_name(&args.file)?;
    let instance_id = args.instance.map(InstanceId::new).unwrap_or_else(InstanceId::generate);

    // Subscribe before submitting so the first event is not missed
    let feed = runtime.bus.subscribe();
    let mut watch = runtime.bus.subscribe_instance(instance_id.clone());
    let (stop, stopped) = oneshot::channel::<()>();
    let router = runtime.router.clone();
    let routing = tokio::spawn(async move {
        router
            .run(feed, async {
                let _ = stopped.await;
            })
            .await
    });

    runtime
        .journal
        .try_put_input(&instance_id, &file_name, &content, &FileMetadata::raw_input(args.expect))
        .await
        .context("Failed to store input")?;
    println!(
        "{}",
        format!("✓ Submitted {} to instance {}", file_name, instance_id).green()
    );

    let summarizer = AgentIdentity::new(collabpage_agents::summarizer::NAME);
    let idle = Duration::from_secs(args.idle_secs);
    let mut shown = HashSet::new();
    loop {
        match tokio::time::timeout(idle, watch.recv()).await {
            Ok(Ok(event)) => {
                debug!(file_name = %event.file_name, "Page changed");
                show_new_summaries(&runtime.journal, &instance_id, &summarizer, &mut shown).await;
            }
            Ok(Err(EventBusError::Lagged(_))) => continue,
            Ok(Err(_)) => break,
            Err(_) => {
                info!(idle_secs = args.idle_secs, "Collaboration idle");
                break;
            }
        }
    }
    // Metadata may land after the last notification
    show_new_summaries(&runtime.journal, &instance_id, &summarizer, &mut shown).await;

    let _ = stop.send(());
    let stats = routing.await.context("Event router task failed")?;
    info!(
        received = stats.received,
        dispatched = stats.dispatched,
        dropped = stats.dropped,
        "Collaboration finished"
    );

    println!();
    println!("{}", "Processing journal:".bold());
    print!("{}", ProcessingJournal::load(&runtime.journal, &instance_id).await);
    Ok(())
}

async fn show_new_summaries(
    journal: &CollaborationJournal,
    instance_id: &InstanceId,
    summarizer: &AgentIdentity,
    shown: &mut HashSet<String>,
) {
    for entry in journal.agent_outputs(instance_id, summarizer, AgentMatch::Same).await {
        if shown.insert(entry.file_name.clone()) {
            println!("{} {}", "Result:".bold().cyan(), entry.content);
        }
    }
}
