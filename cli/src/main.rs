// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Atlas Ingest CLI
//!
//! The `atlas` binary fetches geography facts from one LLM provider and
//! stores the normalised records in PostgreSQL.
//!
//! ## Commands
//!
//! - `atlas country <NAME>` - One country, then its five most populous cities
//! - `atlas continent <NAME>` - One continent
//! - `atlas batch` - A list of countries or continents, one provider, in order
//! - `atlas config show|validate` - Configuration inspection
//!
//! Exits with status 1 when any entity in the run failed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use atlas_ingest::commands::{self, BatchArgs, ConfigCommand, ContinentArgs, CountryArgs};

/// Atlas Ingest - LLM-sourced geography facts into PostgreSQL
#[derive(Parser)]
#[command(name = "atlas")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "ATLAS_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "ATLAS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and store one country (and its cities)
    #[command(name = "country")]
    Country(CountryArgs),

    /// Fetch and store one continent
    #[command(name = "continent")]
    Continent(ContinentArgs),

    /// Run a list of entities against one provider
    #[command(name = "batch")]
    Batch(BatchArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let all_succeeded = match cli.command {
        Commands::Country(args) => commands::ingest::country(args, cli.config).await?,
        Commands::Continent(args) => commands::ingest::continent(args, cli.config).await?,
        Commands::Batch(args) => commands::ingest::batch(args, cli.config).await?,
        Commands::Config { command } => {
            commands::config::handle_command(command, cli.config).await?;
            true
        }
    };

    if !all_succeeded {
        std::process::exit(1);
    }
    Ok(())
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
