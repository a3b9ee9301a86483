// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Long-running runtime: host the reactors and route change events until a
//! shutdown signal arrives.
//!
//! Events come from the store's own change feed. With `--stdin-events` every
//! line on stdin is also treated as one transport message, which lets an
//! external notification source be piped in.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};

use collabpage_core::domain::config::RuntimeConfig;
use collabpage_core::infrastructure::EventBus;

use crate::bootstrap::Runtime;

pub async fn handle_command(
    config_path: Option<PathBuf>,
    stdin_events: bool,
    metrics_port: Option<u16>,
) -> Result<()> {
    let config = RuntimeConfig::load_or_default(config_path).context("Failed to load configuration")?;

    if let Some(port) = metrics_port {
        install_metrics_exporter(port)?;
    }

    let runtime = Runtime::build(config)?;
    info!(
        name = %runtime.config.metadata.name,
        container = %runtime.journal.container(),
        agents = runtime.host.registry().len(),
        "Collaboration runtime starting"
    );

    let feed = runtime.bus.subscribe();
    if stdin_events {
        tokio::spawn(forward_stdin(runtime.bus.clone()));
    }

    let stats = runtime.router.run(feed, shutdown_signal()).await;
    info!(
        received = stats.received,
        dispatched = stats.dispatched,
        dropped = stats.dropped,
        "Collaboration runtime stopped"
    );
    Ok(())
}

/// Serve Prometheus metrics on `0.0.0.0:{port}`.
pub fn install_metrics_exporter(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("Failed to start metrics exporter on {}", addr))?;
    info!(%addr, "Metrics exporter listening");
    Ok(())
}

async fn forward_stdin(bus: EventBus) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => bus.publish_raw(line),
            Ok(None) => {
                info!("Stdin closed, no more external events");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read event from stdin");
                break;
            }
        }
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
