// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Batch requests, per-entity outcomes and the run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::error::{ErrorKind, PipelineError};
use crate::domain::provider::ProviderKind;
use crate::domain::records::EntityKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRequest {
    pub kind: EntityKind,
    pub name: String,
    /// Continent natural key for a country request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
}

impl EntityRequest {
    pub fn continent(name: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Continent,
            name: name.into(),
            continent: None,
        }
    }

    pub fn country(name: impl Into<String>, continent: Option<String>) -> Self {
        Self {
            kind: EntityKind::Country,
            name: name.into(),
            continent,
        }
    }

    pub fn cities(country: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Cities,
            name: country.into(),
            continent: None,
        }
    }
}

impl fmt::Display for EntityRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Fetch and validate, but never touch the store.
    pub dry_run: bool,
    /// Country requests stop after the country row.
    pub skip_cities: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub entity: String,
    pub kind: EntityKind,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Cities validated (and stored, unless dry) for this entity.
    #[serde(default)]
    pub city_count: usize,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn succeeded(request: &EntityRequest, city_count: usize, elapsed: Duration) -> Self {
        Self {
            entity: request.name.clone(),
            kind: request.kind,
            success: true,
            error_kind: None,
            message: None,
            city_count,
            elapsed,
        }
    }

    pub fn failed(request: &EntityRequest, error: &PipelineError, elapsed: Duration) -> Self {
        Self {
            entity: request.name.clone(),
            kind: request.kind,
            success: false,
            error_kind: Some(error.kind()),
            message: Some(error.to_string()),
            city_count: 0,
            elapsed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub provider: ProviderKind,
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchSummary {
    pub fn new(
        provider: ProviderKind,
        started_at: DateTime<Utc>,
        dry_run: bool,
        elapsed: Duration,
        outcomes: Vec<BatchOutcome>,
    ) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        Self {
            provider,
            started_at,
            dry_run,
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            elapsed,
            outcomes,
        }
    }

    /// Mean wall time per entity; zero for an empty batch.
    pub fn average_per_entity(&self) -> Duration {
        if self.total == 0 {
            return Duration::ZERO;
        }
        self.elapsed / self.total as u32
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}
