// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Geographic Repository Interface
//!
//! Persistence contract for the four reference tables, defined in the domain
//! layer and implemented in `crate::infrastructure::repositories`.
//!
//! | Table | Natural key | References |
//! |-------|-------------|------------|
//! | `ai_models` | `(model_provider, model_name)` | |
//! | `continents` | `name` | `ai_models` (provenance) |
//! | `countries` | `name` | `ai_models`, `continents` (nullable) |
//! | `cities` | `(country_id, name)` | `countries` |
//!
//! Every write is an upsert on the natural key: a second run over the same
//! entity refreshes the row in place and returns the same surrogate id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::records::{CityRecord, ContinentRecord, CountryRecord, ModelIdentity};

macro_rules! surrogate_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub i64);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

surrogate_id!(AiModelId, ContinentId, CountryId, CityId);

#[async_trait]
pub trait GeoRepository: Send + Sync {
    /// Insert or refresh the provenance row for a provider/model pair.
    async fn upsert_ai_model(&self, identity: &ModelIdentity) -> Result<AiModelId, RepositoryError>;

    async fn find_continent_id(&self, name: &str) -> Result<Option<ContinentId>, RepositoryError>;

    /// Return the continent's id, creating a name-only row if it does not exist.
    /// Existing attribute values are left untouched.
    async fn ensure_continent(&self, name: &str) -> Result<ContinentId, RepositoryError>;

    async fn upsert_continent(
        &self,
        record: &ContinentRecord,
        ai_model_id: AiModelId,
    ) -> Result<ContinentId, RepositoryError>;

    async fn find_country_id(&self, name: &str) -> Result<Option<CountryId>, RepositoryError>;

    async fn upsert_country(
        &self,
        record: &CountryRecord,
        ai_model_id: AiModelId,
        continent_id: Option<ContinentId>,
    ) -> Result<CountryId, RepositoryError>;

    async fn upsert_city(
        &self,
        record: &CityRecord,
        country_id: CountryId,
    ) -> Result<CityId, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A referenced parent row does not exist.
    #[error("Referential integrity violation: {0}")]
    Referential(String),

    #[error("Natural key conflict: {0}")]
    Conflict(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::Referential(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(db.message().to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}
