// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Batch Runner
//!
//! Runs a list of entity requests through one provider's pipeline, strictly
//! one at a time. A failed entity is recorded and the batch moves on.

use chrono::Utc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::application::pipeline::EntityPipeline;
use crate::domain::batch::{BatchOutcome, BatchSummary, EntityRequest};

pub struct BatchRunner {
    pipeline: EntityPipeline,
}

impl BatchRunner {
    pub fn new(pipeline: EntityPipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &EntityPipeline {
        &self.pipeline
    }

    pub async fn run(&self, requests: &[EntityRequest]) -> BatchSummary {
        let provider = self.pipeline.provider();
        let dry_run = self.pipeline.options().dry_run;
        let started_at = Utc::now();
        let clock = Instant::now();

        info!(
            provider = %provider,
            model = %self.pipeline.identity().model_name,
            total = requests.len(),
            dry_run,
            "starting batch"
        );

        let mut outcomes = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            let entity_clock = Instant::now();
            let result = self.pipeline.process(request).await;
            let elapsed = entity_clock.elapsed();

            let outcome = match result {
                Ok(report) => {
                    info!(
                        position = index + 1,
                        total = requests.len(),
                        entity = %request,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "entity processed"
                    );
                    BatchOutcome::succeeded(request, report.city_count, elapsed)
                }
                Err(error) => {
                    warn!(
                        position = index + 1,
                        total = requests.len(),
                        entity = %request,
                        error_kind = %error.kind(),
                        error = %error,
                        "entity failed"
                    );
                    BatchOutcome::failed(request, &error, elapsed)
                }
            };
            outcomes.push(outcome);
        }

        let summary = BatchSummary::new(provider, started_at, dry_run, clock.elapsed(), outcomes);
        info!(
            provider = %provider,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            average_ms = summary.average_per_entity().as_millis() as u64,
            "batch complete"
        );
        summary
    }
}
