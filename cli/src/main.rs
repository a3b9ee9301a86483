// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # CollabPage CLI
//!
//! The `collab` binary hosts agent reactors over a shared collaboration page
//! and inspects what they wrote.
//!
//! ## Commands
//!
//! - `collab runtime` - Host reactors and route change events until Ctrl+C
//! - `collab run --file F --expect TEXT` - Submit once and watch the collaboration finish
//! - `collab submit|journal|instances` - Work with the page directly
//! - `collab agent list|call` - Built-in agents
//! - `collab config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use collabpage::commands::{self, AgentCommand, ConfigCommand, RunArgs};

/// CollabPage - decentralized agent choreography over a shared page
#[derive(Parser)]
#[command(name = "collab")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "COLLAB_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "COLLAB_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Host the agent reactors and route change events
    #[command(name = "runtime")]
    Runtime {
        /// Also read change events from stdin, one JSON message per line
        #[arg(long)]
        stdin_events: bool,

        /// Serve Prometheus metrics on this port
        #[arg(long, env = "COLLAB_METRICS_PORT")]
        metrics_port: Option<u16>,
    },

    /// Submit a file and watch the collaboration until it goes idle
    #[command(name = "run")]
    Run {
        /// Input file
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Expected processing output, handed to the contribution oracle
        #[arg(short, long, value_name = "TEXT")]
        expect: String,

        /// Instance id (default: generated)
        #[arg(short, long)]
        instance: Option<String>,

        /// Seconds without page changes before the run ends
        #[arg(long, default_value = "30")]
        idle_secs: u64,
    },

    /// Store raw input on the page
    #[command(name = "submit")]
    Submit {
        /// Input file
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Expected processing output, handed to the contribution oracle
        #[arg(short, long, value_name = "TEXT")]
        expect: String,

        /// Instance id (default: generated)
        #[arg(short, long)]
        instance: Option<String>,
    },

    /// Print the processing journal of an instance
    #[command(name = "journal")]
    Journal {
        #[arg(short, long)]
        instance: String,
    },

    /// List instances on the page
    #[command(name = "instances")]
    Instances,

    /// Built-in agents
    #[command(name = "agent")]
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Both files are optional; values already loaded win
    let _ = dotenvy::from_filename("application.env");
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Runtime {
            stdin_events,
            metrics_port,
        }) => commands::runtime::handle_command(cli.config, stdin_events, metrics_port).await,
        Some(Commands::Run {
            file,
            expect,
            instance,
            idle_secs,
        }) => {
            let args = RunArgs {
                file,
                expect,
                instance,
                idle_secs,
            };
            commands::run::handle_command(cli.config, args).await
        }
        Some(Commands::Submit { file, expect, instance }) => {
            commands::journal::submit(cli.config, file, expect, instance).await
        }
        Some(Commands::Journal { instance }) => commands::journal::show_journal(cli.config, instance).await,
        Some(Commands::Instances) => commands::journal::list_instances(cli.config).await,
        Some(Commands::Agent { command }) => commands::agent::handle_command(command, cli.config).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}
