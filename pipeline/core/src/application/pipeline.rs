// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Entity Pipeline
//!
//! fetch → sanitize/validate → persist for a single [`EntityRequest`]. A
//! country request also fetches and stores the country's cities unless
//! `skip_cities` is set. In dry-run mode nothing reaches the store.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::application::persistence::PersistenceOrchestrator;
use crate::application::retry::RetryCoordinator;
use crate::application::validator;
use crate::domain::batch::{BatchOptions, EntityRequest};
use crate::domain::config::ConfigError;
use crate::domain::error::PipelineError;
use crate::domain::provider::{ProviderAdapter, ProviderKind};
use crate::domain::records::{EntityKind, ModelIdentity};
use crate::domain::repository::{AiModelId, CityId, ContinentId, CountryId};

/// What one processed entity produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityReport {
    pub ai_model_id: Option<AiModelId>,
    pub continent_id: Option<ContinentId>,
    pub country_id: Option<CountryId>,
    pub city_ids: Vec<CityId>,
    /// Cities validated, whether or not they were stored.
    pub city_count: usize,
}

pub struct EntityPipeline {
    adapter: Arc<dyn ProviderAdapter>,
    retry: RetryCoordinator,
    identity: ModelIdentity,
    store: Option<PersistenceOrchestrator>,
    options: BatchOptions,
}

impl EntityPipeline {
    /// `store` may only be absent for dry runs.
    pub fn new(
        adapter: Arc<dyn ProviderAdapter>,
        store: Option<PersistenceOrchestrator>,
        options: BatchOptions,
    ) -> Result<Self, ConfigError> {
        if store.is_none() && !options.dry_run {
            return Err(ConfigError::MissingStore);
        }
        let retry = RetryCoordinator::for_adapter(adapter.as_ref());
        let identity = adapter.fetch_identity();
        Ok(Self {
            adapter,
            retry,
            identity,
            store,
            options,
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.adapter.kind()
    }

    pub fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    pub fn options(&self) -> BatchOptions {
        self.options
    }

    fn store(&self) -> Option<&PersistenceOrchestrator> {
        if self.options.dry_run {
            None
        } else {
            self.store.as_ref()
        }
    }

    #[instrument(
        skip_all,
        fields(provider = %self.adapter.kind(), kind = %request.kind, entity = %request.name)
    )]
    pub async fn process(&self, request: &EntityRequest) -> Result<EntityReport, PipelineError> {
        match request.kind {
            EntityKind::Continent => self.process_continent(request).await,
            EntityKind::Country => self.process_country(request).await,
            EntityKind::Cities => self.process_cities(&request.name).await,
        }
    }

    async fn process_continent(
        &self,
        request: &EntityRequest,
    ) -> Result<EntityReport, PipelineError> {
        let raw = self
            .retry
            .fetch(self.adapter.as_ref(), EntityKind::Continent, &request.name)
            .await?;
        let record = validator::validate_continent(&raw, &request.name)?;

        let mut report = EntityReport::default();
        if let Some(store) = self.store() {
            report.continent_id = Some(store.persist_continent(&record, &self.identity).await?);
        } else {
            debug!("dry run, continent not persisted");
        }
        Ok(report)
    }

    async fn process_country(
        &self,
        request: &EntityRequest,
    ) -> Result<EntityReport, PipelineError> {
        let raw = self
            .retry
            .fetch(self.adapter.as_ref(), EntityKind::Country, &request.name)
            .await?;
        let record = validator::validate_country(
            &raw,
            &request.name,
            request.continent.as_deref(),
            &self.identity,
        )?;

        let mut report = EntityReport::default();
        let country_id = match self.store() {
            Some(store) => {
                let persisted = store.persist_country(&record).await?;
                report.ai_model_id = Some(persisted.ai_model_id);
                report.continent_id = persisted.continent_id;
                report.country_id = Some(persisted.country_id);
                Some(persisted.country_id)
            }
            None => None,
        };

        if self.options.skip_cities {
            return Ok(report);
        }

        let raw = self
            .retry
            .fetch(self.adapter.as_ref(), EntityKind::Cities, &request.name)
            .await?;
        let cities = validator::validate_cities(&raw, &request.name)?;
        report.city_count = cities.len();

        if let (Some(store), Some(country_id)) = (self.store(), country_id) {
            report.city_ids = store.persist_cities(country_id, &cities).await?;
        }
        info!(cities = report.city_count, "country processed");
        Ok(report)
    }

    async fn process_cities(&self, country: &str) -> Result<EntityReport, PipelineError> {
        let raw = self
            .retry
            .fetch(self.adapter.as_ref(), EntityKind::Cities, country)
            .await?;
        let cities = validator::validate_cities(&raw, country)?;

        let mut report = EntityReport {
            city_count: cities.len(),
            ..Default::default()
        };
        if let Some(store) = self.store() {
            let (country_id, ids) = store.persist_cities_for(country, &cities).await?;
            report.country_id = Some(country_id);
            report.city_ids = ids;
        }
        Ok(report)
    }
}
