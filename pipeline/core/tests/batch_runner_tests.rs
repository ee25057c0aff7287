// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Batch runner tests: per-entity failure isolation, ordering and the
//! summary arithmetic.

mod common;

use std::sync::Arc;

use atlas_core::application::batch_runner::BatchRunner;
use atlas_core::application::persistence::PersistenceOrchestrator;
use atlas_core::application::pipeline::EntityPipeline;
use atlas_core::domain::batch::{BatchOptions, EntityRequest};
use atlas_core::domain::error::ErrorKind;
use atlas_core::domain::provider::{EnforcementTier, ProviderError, ProviderKind};
use atlas_core::domain::records::EntityKind;
use atlas_core::infrastructure::repositories::InMemoryGeoRepository;

use common::{continent_payload, country_payload, ScriptedAdapter};

const COUNTRIES: [&str; 10] = [
    "Nigeria", "Ghana", "Kenya", "Chad", "Mali", "Niger", "Egypt", "Ethiopia", "Angola", "Sudan",
];

fn runner(adapter: Arc<ScriptedAdapter>, repo: &InMemoryGeoRepository) -> BatchRunner {
    let store = PersistenceOrchestrator::new(Arc::new(repo.clone()));
    let options = BatchOptions {
        skip_cities: true,
        ..Default::default()
    };
    BatchRunner::new(EntityPipeline::new(adapter, Some(store), options).unwrap())
}

#[tokio::test]
async fn test_one_bad_entity_does_not_stop_the_batch() {
    let repo = InMemoryGeoRepository::new();
    let adapter = Arc::new(ScriptedAdapter::new(
        ProviderKind::Mistral,
        EnforcementTier::JsonOnly,
        |_, subject, _| {
            if subject == "Chad" {
                Ok("{\"population\": \"a great many\"}".to_string())
            } else {
                Ok(country_payload(1_000_000).to_string())
            }
        },
    ));
    let requests: Vec<_> = COUNTRIES
        .iter()
        .map(|name| EntityRequest::country(*name, Some("Africa".into())))
        .collect();

    let summary = runner(adapter.clone(), &repo).run(&requests).await;

    assert_eq!(summary.total, 10);
    assert_eq!(summary.succeeded, 9);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.provider, ProviderKind::Mistral);

    let failures: Vec<_> = summary.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].entity, "Chad");
    assert_eq!(failures[0].error_kind, Some(ErrorKind::SchemaViolation));
    assert!(failures[0].message.as_deref().unwrap().contains("population"));

    // Entities after the failure were still processed.
    assert_eq!(summary.outcomes[4].entity, "Mali");
    assert!(summary.outcomes[4].success);
    assert_eq!(repo.country_count(), 9);
    assert!(repo.country("Chad").is_none());
    assert_eq!(adapter.total_calls(), 10);
}

#[tokio::test]
async fn test_outcomes_follow_request_order() {
    let repo = InMemoryGeoRepository::new();
    let adapter = Arc::new(ScriptedAdapter::new(
        ProviderKind::Groq,
        EnforcementTier::JsonOnly,
        |kind, _, _| {
            Ok(match kind {
                EntityKind::Continent => continent_payload().to_string(),
                _ => country_payload(5).to_string(),
            })
        },
    ));
    let requests = vec![
        EntityRequest::continent("Africa"),
        EntityRequest::country("Kenya", Some("Africa".into())),
        EntityRequest::country("Peru", Some("South America".into())),
    ];

    let summary = runner(adapter, &repo).run(&requests).await;

    let order: Vec<_> = summary.outcomes.iter().map(|o| o.entity.as_str()).collect();
    assert_eq!(order, vec!["Africa", "Kenya", "Peru"]);
    assert!(summary.is_success());
    assert_eq!(repo.continent_count(), 2);
    assert_eq!(summary.outcomes[0].kind, EntityKind::Continent);
}

#[tokio::test(start_paused = true)]
async fn test_failure_kinds_are_recorded_per_entity() {
    let repo = InMemoryGeoRepository::new();
    let adapter = Arc::new(ScriptedAdapter::new(
        ProviderKind::Cohere,
        EnforcementTier::Enforced,
        |_, subject, _| match subject {
            "Ghana" => Err(ProviderError::RateLimited { retry_after: None }),
            "Kenya" => Err(ProviderError::InvalidRequest {
                status: 400,
                body: "bad schema".into(),
            }),
            _ => Ok(country_payload(7).to_string()),
        },
    ));
    let requests = vec![
        EntityRequest::country("Ghana", None),
        EntityRequest::country("Kenya", None),
        EntityRequest::country("Egypt", None),
    ];

    let summary = runner(adapter, &repo).run(&requests).await;

    let kinds: Vec<_> = summary.outcomes.iter().map(|o| o.error_kind).collect();
    assert_eq!(
        kinds,
        vec![Some(ErrorKind::RateLimit), Some(ErrorKind::ProviderRejected), None]
    );
    assert_eq!(summary.failed, 2);
}

#[tokio::test]
async fn test_empty_batch_summary() {
    let repo = InMemoryGeoRepository::new();
    let adapter = Arc::new(ScriptedAdapter::new(
        ProviderKind::OpenAi,
        EnforcementTier::Enforced,
        |_, _, _| Ok(String::new()),
    ));
    let summary = runner(adapter, &repo).run(&[]).await;
    assert_eq!(summary.total, 0);
    assert_eq!(summary.average_per_entity(), std::time::Duration::ZERO);
}
