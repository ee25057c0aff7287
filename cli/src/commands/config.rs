// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use atlas_core::domain::config::{IngestConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE};
use atlas_core::domain::provider::ProviderKind;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration for every provider
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

        /// Provider whose credential must resolve
        #[arg(short, long)]
        provider: Option<ProviderKind>,

        /// Also require a database URL
        #[arg(long)]
        require_database: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate {
            file,
            provider,
            require_database,
        } => validate(file.or(config_override), provider, require_database),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. {}", DEFAULT_CONFIG_FILE);
        println!();
    }

    let config = IngestConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;

    println!("{}", "Store:".bold());
    match config.require_database_url() {
        Ok(_) => println!("  Database URL: {}", "set".green()),
        Err(_) => println!("  Database URL: {}", "(not set)".dimmed()),
    }
    println!();

    println!("{}", "LLM Providers:".bold());
    for kind in ProviderKind::ALL {
        match config.provider_settings(kind) {
            Ok(settings) => {
                println!("  {} {}", "✓".green(), kind.profile().display_name.bold());
                println!("    Model: {}", settings.model);
                println!("    Endpoint: {}", settings.endpoint);
                println!("    Timeout: {}s", settings.timeout.as_secs());
                println!("    Max attempts: {}", settings.retry.max_attempts);
            }
            Err(e) => {
                println!("  {} {}", "✗".red(), kind.profile().display_name.bold());
                println!("    {}", e.to_string().dimmed());
            }
        }
    }
    println!();

    Ok(())
}

fn validate(
    config_path: Option<PathBuf>,
    provider: Option<ProviderKind>,
    require_database: bool,
) -> Result<()> {
    println!("Validating configuration...");

    let config = IngestConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    for entry in &config.providers {
        config
            .provider_settings(entry.kind)
            .with_context(|| format!("Provider {} is misconfigured", entry.kind))?;
    }
    if let Some(kind) = provider {
        config
            .provider_settings(kind)
            .with_context(|| format!("Provider {} is not usable", kind))?;
    }
    if require_database {
        config.require_database_url()?;
    }

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}
