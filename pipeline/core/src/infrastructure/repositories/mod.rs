// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! - **PostgresGeoRepository** - production storage over `sqlx`
//! - **InMemoryGeoRepository** - the same upsert and foreign-key semantics
//!   without a database, for dry runs and tests

pub mod postgres_geo;

pub use postgres_geo::PostgresGeoRepository;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::records::{CityRecord, ContinentRecord, CountryRecord, ModelIdentity};
use crate::domain::repository::{
    AiModelId, CityId, ContinentId, CountryId, GeoRepository, RepositoryError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredContinent {
    pub id: ContinentId,
    pub name: String,
    /// `None` for a name-only row created while resolving a country.
    pub record: Option<ContinentRecord>,
    pub ai_model_id: Option<AiModelId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredCountry {
    pub id: CountryId,
    pub record: CountryRecord,
    pub ai_model_id: AiModelId,
    pub continent_id: Option<ContinentId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredCity {
    pub id: CityId,
    pub record: CityRecord,
    pub country_id: CountryId,
}

#[derive(Default)]
struct GeoTables {
    next_id: i64,
    ai_models: BTreeMap<i64, ModelIdentity>,
    continents: BTreeMap<i64, StoredContinent>,
    countries: BTreeMap<i64, StoredCountry>,
    cities: BTreeMap<i64, StoredCity>,
}

impl GeoTables {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn continent_by_name(&self, name: &str) -> Option<i64> {
        self.continents.values().find(|c| c.name == name).map(|c| c.id.0)
    }

    fn country_by_name(&self, name: &str) -> Option<i64> {
        self.countries.values().find(|c| c.record.name == name).map(|c| c.id.0)
    }

    fn require_model(&self, id: AiModelId) -> Result<(), RepositoryError> {
        if self.ai_models.contains_key(&id.0) {
            Ok(())
        } else {
            Err(RepositoryError::Referential(format!("ai_model {id} does not exist")))
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryGeoRepository {
    tables: Arc<RwLock<GeoTables>>,
}

impl InMemoryGeoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ai_model_count(&self) -> usize {
        self.tables.read().ai_models.len()
    }

    pub fn continent_count(&self) -> usize {
        self.tables.read().continents.len()
    }

    pub fn country_count(&self) -> usize {
        self.tables.read().countries.len()
    }

    pub fn city_count(&self) -> usize {
        self.tables.read().cities.len()
    }

    pub fn continent(&self, name: &str) -> Option<StoredContinent> {
        let tables = self.tables.read();
        tables
            .continent_by_name(name)
            .and_then(|id| tables.continents.get(&id).cloned())
    }

    pub fn country(&self, name: &str) -> Option<StoredCountry> {
        let tables = self.tables.read();
        tables
            .country_by_name(name)
            .and_then(|id| tables.countries.get(&id).cloned())
    }

    pub fn cities_of(&self, country_id: CountryId) -> Vec<StoredCity> {
        self.tables
            .read()
            .cities
            .values()
            .filter(|c| c.country_id == country_id)
            .cloned()
            .collect()
    }

    pub fn ai_model(&self, id: AiModelId) -> Option<ModelIdentity> {
        self.tables.read().ai_models.get(&id.0).cloned()
    }
}

#[async_trait]
impl GeoRepository for InMemoryGeoRepository {
    async fn upsert_ai_model(
        &self,
        identity: &ModelIdentity,
    ) -> Result<AiModelId, RepositoryError> {
        let mut tables = self.tables.write();
        if let Some((id, _)) = tables.ai_models.iter().find(|(_, m)| *m == identity) {
            return Ok(AiModelId(*id));
        }
        let id = tables.allocate();
        tables.ai_models.insert(id, identity.clone());
        Ok(AiModelId(id))
    }

    async fn find_continent_id(&self, name: &str) -> Result<Option<ContinentId>, RepositoryError> {
        Ok(self.tables.read().continent_by_name(name).map(ContinentId))
    }

    async fn ensure_continent(&self, name: &str) -> Result<ContinentId, RepositoryError> {
        let mut tables = self.tables.write();
        if let Some(id) = tables.continent_by_name(name) {
            return Ok(ContinentId(id));
        }
        let id = ContinentId(tables.allocate());
        tables.continents.insert(
            id.0,
            StoredContinent {
                id,
                name: name.to_string(),
                record: None,
                ai_model_id: None,
            },
        );
        Ok(id)
    }

    async fn upsert_continent(
        &self,
        record: &ContinentRecord,
        ai_model_id: AiModelId,
    ) -> Result<ContinentId, RepositoryError> {
        let mut tables = self.tables.write();
        tables.require_model(ai_model_id)?;
        let id = match tables.continent_by_name(&record.name) {
            Some(id) => ContinentId(id),
            None => ContinentId(tables.allocate()),
        };
        tables.continents.insert(
            id.0,
            StoredContinent {
                id,
                name: record.name.clone(),
                record: Some(record.clone()),
                ai_model_id: Some(ai_model_id),
            },
        );
        Ok(id)
    }

    async fn find_country_id(&self, name: &str) -> Result<Option<CountryId>, RepositoryError> {
        Ok(self.tables.read().country_by_name(name).map(CountryId))
    }

    async fn upsert_country(
        &self,
        record: &CountryRecord,
        ai_model_id: AiModelId,
        continent_id: Option<ContinentId>,
    ) -> Result<CountryId, RepositoryError> {
        let mut tables = self.tables.write();
        tables.require_model(ai_model_id)?;
        if let Some(continent_id) = continent_id {
            if !tables.continents.contains_key(&continent_id.0) {
                return Err(RepositoryError::Referential(format!(
                    "continent {continent_id} does not exist"
                )));
            }
        }
        let id = match tables.country_by_name(&record.name) {
            Some(id) => CountryId(id),
            None => CountryId(tables.allocate()),
        };
        tables.countries.insert(
            id.0,
            StoredCountry {
                id,
                record: record.clone(),
                ai_model_id,
                continent_id,
            },
        );
        Ok(id)
    }

    async fn upsert_city(
        &self,
        record: &CityRecord,
        country_id: CountryId,
    ) -> Result<CityId, RepositoryError> {
        let mut tables = self.tables.write();
        if !tables.countries.contains_key(&country_id.0) {
            return Err(RepositoryError::Referential(format!(
                "country {country_id} does not exist"
            )));
        }
        let existing = tables
            .cities
            .values()
            .find(|c| c.country_id == country_id && c.record.name == record.name)
            .map(|c| c.id);
        let id = match existing {
            Some(id) => id,
            None => CityId(tables.allocate()),
        };
        tables.cities.insert(
            id.0,
            StoredCity {
                id,
                record: record.clone(),
                country_id,
            },
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ai_model_upsert_is_idempotent() {
        let repo = InMemoryGeoRepository::new();
        let identity = ModelIdentity::new("OpenAI", "gpt-4o");
        let first = repo.upsert_ai_model(&identity).await.unwrap();
        let second = repo.upsert_ai_model(&identity).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(repo.ai_model_count(), 1);
        let mini = ModelIdentity::new("OpenAI", "gpt-4o-mini");
        assert_ne!(repo.upsert_ai_model(&mini).await.unwrap(), first);
    }

    #[tokio::test]
    async fn ensure_continent_keeps_existing_attributes() {
        let repo = InMemoryGeoRepository::new();
        let model = repo.upsert_ai_model(&ModelIdentity::new("Google", "gemini")).await.unwrap();
        let record = ContinentRecord {
            name: "Africa".into(),
            country_count: 54,
            ..Default::default()
        };
        let id = repo.upsert_continent(&record, model).await.unwrap();
        assert_eq!(repo.ensure_continent("Africa").await.unwrap(), id);
        assert_eq!(repo.continent("Africa").unwrap().record.unwrap().country_count, 54);
    }

    #[tokio::test]
    async fn city_upsert_refreshes_in_place() {
        let repo = InMemoryGeoRepository::new();
        let model = repo.upsert_ai_model(&ModelIdentity::new("Groq", "llama")).await.unwrap();
        let country = CountryRecord {
            name: "Nigeria".into(),
            ..Default::default()
        };
        let country_id = repo.upsert_country(&country, model, None).await.unwrap();

        let mut lagos = CityRecord {
            name: "Lagos".into(),
            population: 15_000_000,
            ..Default::default()
        };
        let first = repo.upsert_city(&lagos, country_id).await.unwrap();
        lagos.population = 16_000_000;
        let second = repo.upsert_city(&lagos, country_id).await.unwrap();

        assert_eq!(first, second);
        let cities = repo.cities_of(country_id);
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].record.population, 16_000_000);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let repo = InMemoryGeoRepository::new();
        let city = CityRecord {
            name: "Lagos".into(),
            ..Default::default()
        };
        assert!(matches!(
            repo.upsert_city(&city, CountryId(99)).await,
            Err(RepositoryError::Referential(_))
        ));

        let country = CountryRecord {
            name: "Chad".into(),
            ..Default::default()
        };
        assert!(matches!(
            repo.upsert_country(&country, AiModelId(1), None).await,
            Err(RepositoryError::Referential(_))
        ));
    }
}
