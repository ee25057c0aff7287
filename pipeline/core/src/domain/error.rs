// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Error taxonomy shared by the pipeline and the batch summary.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::config::ConfigError;
use crate::domain::provider::ProviderError;
use crate::domain::repository::RepositoryError;

/// Coarse failure category recorded per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network, timeout, 5xx, empty or malformed provider output; retried up to budget.
    TransientProvider,
    RateLimit,
    /// The provider refused the request (credentials, 4xx); never retried.
    ProviderRejected,
    SchemaViolation,
    Persistence,
    FatalConfig,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TransientProvider => "transient_provider",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ProviderRejected => "provider_rejected",
            ErrorKind::SchemaViolation => "schema_violation",
            ErrorKind::Persistence => "persistence",
            ErrorKind::FatalConfig => "fatal_config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reply that could not be coerced into a record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("schema violation for {entity}: {reason} [{}]", .fields.join(", "))]
pub struct SchemaViolationError {
    pub entity: String,
    pub reason: String,
    /// Offending field paths, e.g. `population` or `cities[2].name`.
    pub fields: Vec<String>,
}

impl SchemaViolationError {
    pub fn new(entity: impl Into<String>, reason: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            entity: entity.into(),
            reason: reason.into(),
            fields,
        }
    }
}

/// Everything that can stop one entity from being processed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Schema(#[from] SchemaViolationError),

    #[error(transparent)]
    Persistence(#[from] RepositoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Provider(e) => e.kind(),
            PipelineError::Schema(_) => ErrorKind::SchemaViolation,
            PipelineError::Persistence(_) => ErrorKind::Persistence,
            PipelineError::Config(_) => ErrorKind::FatalConfig,
        }
    }
}
