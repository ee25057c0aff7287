// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Ingest commands
//!
//! Commands: country, continent, batch
//!
//! Every configuration failure (credential, database URL, connection) is
//! raised before the first entity is requested.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use atlas_core::application::batch_runner::BatchRunner;
use atlas_core::application::persistence::PersistenceOrchestrator;
use atlas_core::application::pipeline::EntityPipeline;
use atlas_core::domain::batch::{BatchOptions, BatchSummary, EntityRequest};
use atlas_core::domain::config::IngestConfig;
use atlas_core::domain::provider::ProviderKind;
use atlas_core::domain::records::EntityKind;
use atlas_core::infrastructure::db::Database;
use atlas_core::infrastructure::llm::adapter_from_config;

use crate::output;

#[derive(Args, Debug, Clone)]
pub struct RunFlags {
    /// Provider to query (ai21, anthropic, cohere, deepseek, google, groq, mistral, openai)
    #[arg(short, long, env = "ATLAS_PROVIDER", default_value = "openai")]
    pub provider: ProviderKind,

    /// Fetch and validate only; nothing is written
    #[arg(long)]
    pub dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CountryArgs {
    /// Country name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Continent the country belongs to
    #[arg(long, value_name = "CONTINENT")]
    pub continent: Option<String>,

    /// Do not fetch the country's cities
    #[arg(long)]
    pub skip_cities: bool,

    #[command(flatten)]
    pub run: RunFlags,
}

#[derive(Args, Debug, Clone)]
pub struct ContinentArgs {
    /// Continent name
    #[arg(value_name = "NAME")]
    pub name: String,

    #[command(flatten)]
    pub run: RunFlags,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Entity kind of every name in the batch
    #[arg(short, long, default_value = "country")]
    pub kind: EntityKind,

    /// File with one name per line (`Name` or `Name | Continent`)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Names given inline, after any read from --file
    #[arg(value_name = "NAMES", action = ArgAction::Append)]
    pub names: Vec<String>,

    /// Continent applied to inline country names
    #[arg(long, value_name = "CONTINENT")]
    pub continent: Option<String>,

    /// Do not fetch cities for countries
    #[arg(long)]
    pub skip_cities: bool,

    #[command(flatten)]
    pub run: RunFlags,
}

pub async fn country(args: CountryArgs, config_path: Option<PathBuf>) -> Result<bool> {
    let request = EntityRequest::country(args.name, args.continent);
    let options = BatchOptions {
        dry_run: args.run.dry_run,
        skip_cities: args.skip_cities,
    };
    execute(&args.run, options, vec![request], config_path).await
}

pub async fn continent(args: ContinentArgs, config_path: Option<PathBuf>) -> Result<bool> {
    let request = EntityRequest::continent(args.name);
    let options = BatchOptions {
        dry_run: args.run.dry_run,
        skip_cities: true,
    };
    execute(&args.run, options, vec![request], config_path).await
}

pub async fn batch(args: BatchArgs, config_path: Option<PathBuf>) -> Result<bool> {
    let requests = collect_requests(&args)?;
    if requests.is_empty() {
        bail!("No entities given. Pass names or --file.");
    }
    let options = BatchOptions {
        dry_run: args.run.dry_run,
        skip_cities: args.skip_cities,
    };
    execute(&args.run, options, requests, config_path).await
}

async fn execute(
    flags: &RunFlags,
    options: BatchOptions,
    requests: Vec<EntityRequest>,
    config_path: Option<PathBuf>,
) -> Result<bool> {
    let config =
        IngestConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let adapter = adapter_from_config(&config, flags.provider)?;

    let store = if options.dry_run {
        info!("Dry run: the store will not be touched");
        None
    } else {
        let url = config.require_database_url()?;
        let database = Database::new(&url)
            .await
            .context("Failed to connect to database")?;
        Some(PersistenceOrchestrator::new(Arc::new(database.geo_repository())))
    };

    let pipeline = EntityPipeline::new(adapter, store, options)?;
    info!(
        provider = %flags.provider,
        model = %pipeline.identity(),
        entities = requests.len(),
        "Starting run"
    );

    let summary = BatchRunner::new(pipeline).run(&requests).await;
    report(&summary, flags.json)?;
    Ok(summary.is_success())
}

fn report(summary: &BatchSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        output::print_summary(summary);
    }
    Ok(())
}

fn collect_requests(args: &BatchArgs) -> Result<Vec<EntityRequest>> {
    if args.kind == EntityKind::Cities {
        bail!("Batch kind must be country or continent; cities are fetched with their country");
    }

    let mut requests = Vec::new();
    if let Some(path) = &args.file {
        requests.extend(read_batch_file(path, args.kind)?);
    }
    for name in &args.names {
        requests.push(make_request(args.kind, name.trim(), args.continent.clone()));
    }
    Ok(requests)
}

fn read_batch_file(path: &Path, kind: EntityKind) -> Result<Vec<EntityRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {:?}", path))?;
    Ok(parse_batch_lines(&content, kind))
}

/// Blank lines and `#` comments are skipped.
pub fn parse_batch_lines(content: &str, kind: EntityKind) -> Vec<EntityRequest> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once('|') {
            Some((name, continent)) => {
                let continent = continent.trim();
                let continent = (!continent.is_empty()).then(|| continent.to_string());
                make_request(kind, name.trim(), continent)
            }
            None => make_request(kind, line, None),
        })
        .collect()
}

fn make_request(kind: EntityKind, name: &str, continent: Option<String>) -> EntityRequest {
    match kind {
        EntityKind::Continent => EntityRequest::continent(name),
        EntityKind::Cities => EntityRequest::cities(name),
        EntityKind::Country => EntityRequest::country(name, continent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(kind: EntityKind, names: &[&str]) -> BatchArgs {
        BatchArgs {
            kind,
            file: None,
            names: names.iter().map(|n| n.to_string()).collect(),
            continent: None,
            skip_cities: false,
            run: RunFlags {
                provider: ProviderKind::OpenAi,
                dry_run: true,
                json: false,
            },
        }
    }

    #[test]
    fn batch_lines_skip_comments_and_split_continent() {
        let requests = parse_batch_lines(
            "# West Africa\nNigeria | Africa\n\n  Ghana  \nPeru |\n",
            EntityKind::Country,
        );
        assert_eq!(
            requests,
            vec![
                EntityRequest::country("Nigeria", Some("Africa".into())),
                EntityRequest::country("Ghana", None),
                EntityRequest::country("Peru", None),
            ]
        );
    }

    #[test]
    fn continent_lines_ignore_the_continent_column() {
        let requests = parse_batch_lines("Asia | ignored", EntityKind::Continent);
        assert_eq!(requests, vec![EntityRequest::continent("Asia")]);
    }

    #[test]
    fn file_entries_come_before_inline_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Kenya | Africa").unwrap();

        let mut batch = args(EntityKind::Country, &["Chad"]);
        batch.file = Some(file.path().to_path_buf());
        batch.continent = Some("Africa".into());

        let names: Vec<_> = collect_requests(&batch)
            .unwrap()
            .into_iter()
            .map(|r| (r.name, r.continent))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Kenya".to_string(), Some("Africa".to_string())),
                ("Chad".to_string(), Some("Africa".to_string())),
            ]
        );
    }

    #[test]
    fn cities_batches_are_rejected() {
        assert!(collect_requests(&args(EntityKind::Cities, &["Chad"])).is_err());
    }

    #[test]
    fn unreadable_batch_file_is_an_error() {
        let mut batch = args(EntityKind::Country, &[]);
        batch.file = Some(PathBuf::from("/nonexistent/atlas-batch.txt"));
        assert!(collect_requests(&batch).is_err());
    }
}
