// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Persistence Orchestrator
//!
//! Writes validated records in foreign-key order:
//!
//! 1. AI model (provenance)
//! 2. continent, resolved by name or created name-only
//! 3. country, referencing both
//! 4. cities, keyed on `(country_id, name)`
//!
//! Each step is an independent upsert. A failure part-way leaves the rows
//! already written in place; re-running the same entity converges on the same
//! ids because every write is keyed on the natural key.

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::records::{CityRecord, ContinentRecord, CountryRecord, ModelIdentity};
use crate::domain::repository::{
    AiModelId, CityId, ContinentId, CountryId, GeoRepository, RepositoryError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedCountry {
    pub ai_model_id: AiModelId,
    pub continent_id: Option<ContinentId>,
    pub country_id: CountryId,
}

#[derive(Clone)]
pub struct PersistenceOrchestrator {
    repository: Arc<dyn GeoRepository>,
}

impl PersistenceOrchestrator {
    pub fn new(repository: Arc<dyn GeoRepository>) -> Self {
        Self { repository }
    }

    pub async fn upsert_model(
        &self,
        identity: &ModelIdentity,
    ) -> Result<AiModelId, RepositoryError> {
        self.repository.upsert_ai_model(identity).await
    }

    /// Look the continent up by name, creating a name-only row when absent.
    pub async fn resolve_continent(&self, name: &str) -> Result<ContinentId, RepositoryError> {
        if let Some(id) = self.repository.find_continent_id(name).await? {
            return Ok(id);
        }
        debug!(continent = name, "continent not found, creating placeholder row");
        self.repository.ensure_continent(name).await
    }

    pub async fn persist_continent(
        &self,
        record: &ContinentRecord,
        identity: &ModelIdentity,
    ) -> Result<ContinentId, RepositoryError> {
        let ai_model_id = self.upsert_model(identity).await?;
        let id = self.repository.upsert_continent(record, ai_model_id).await?;
        info!(continent = %record.name, continent_id = %id, "continent persisted");
        Ok(id)
    }

    /// Steps 1-3 for one country. A country without a continent reference is
    /// stored with a NULL continent link.
    pub async fn persist_country(
        &self,
        record: &CountryRecord,
    ) -> Result<PersistedCountry, RepositoryError> {
        let ai_model_id = self.upsert_model(&record.provenance).await?;
        let continent_id = match record.continent.as_deref() {
            Some(name) => Some(self.resolve_continent(name).await?),
            None => None,
        };
        let country_id = self
            .repository
            .upsert_country(record, ai_model_id, continent_id)
            .await?;
        info!(country = %record.name, country_id = %country_id, "country persisted");
        Ok(PersistedCountry {
            ai_model_id,
            continent_id,
            country_id,
        })
    }

    /// Step 4. Stops at the first failing city; earlier cities stay written.
    pub async fn persist_cities(
        &self,
        country_id: CountryId,
        cities: &[CityRecord],
    ) -> Result<Vec<CityId>, RepositoryError> {
        let mut ids = Vec::with_capacity(cities.len());
        for city in cities {
            ids.push(self.repository.upsert_city(city, country_id).await?);
        }
        debug!(country_id = %country_id, cities = ids.len(), "cities persisted");
        Ok(ids)
    }

    /// Cities for a country that must already exist.
    pub async fn persist_cities_for(
        &self,
        country: &str,
        cities: &[CityRecord],
    ) -> Result<(CountryId, Vec<CityId>), RepositoryError> {
        let country_id = self
            .repository
            .find_country_id(country)
            .await?
            .ok_or_else(|| {
                RepositoryError::Referential(format!("country '{country}' has not been persisted"))
            })?;
        let ids = self.persist_cities(country_id, cities).await?;
        Ok((country_id, ids))
    }
}
