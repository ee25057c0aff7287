// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Geographic Repository
//!
//! `GeoRepository` backed by the `ai_models`, `continents`, `countries` and
//! `cities` tables via `sqlx`. Every write is a single autocommitted
//! `INSERT ... ON CONFLICT (natural key) DO UPDATE ... RETURNING id`.
//!
//! Surrogate keys are `SERIAL` columns; they are cast to `BIGINT` on the way
//! out so one id type covers every table.

use async_trait::async_trait;
use sqlx::postgres::PgPool;

use crate::domain::records::{CityRecord, ContinentRecord, CountryRecord, ModelIdentity};
use crate::domain::repository::{
    AiModelId, CityId, ContinentId, CountryId, GeoRepository, RepositoryError,
};

pub struct PostgresGeoRepository {
    pool: PgPool,
}

impl PostgresGeoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GeoRepository for PostgresGeoRepository {
    async fn upsert_ai_model(
        &self,
        identity: &ModelIdentity,
    ) -> Result<AiModelId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO ai_models (model_provider, model_name, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            ON CONFLICT (model_provider, model_name) DO UPDATE SET
                updated_at = NOW()
            RETURNING ai_model_id::BIGINT
            "#,
        )
        .bind(&identity.provider)
        .bind(&identity.model_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(AiModelId(id))
    }

    async fn find_continent_id(&self, name: &str) -> Result<Option<ContinentId>, RepositoryError> {
        let id: Option<i64> = sqlx::query_scalar(
            "SELECT continent_id::BIGINT FROM continents WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id.map(ContinentId))
    }

    async fn ensure_continent(&self, name: &str) -> Result<ContinentId, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO continents (name, created_at, updated_at)
            VALUES ($1, NOW(), NOW())
            ON CONFLICT (name) DO UPDATE SET
                name = EXCLUDED.name
            RETURNING continent_id::BIGINT
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(ContinentId(id))
    }

    async fn upsert_continent(
        &self,
        record: &ContinentRecord,
        ai_model_id: AiModelId,
    ) -> Result<ContinentId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO continents (
                name, description, area_sq_mile, area_sq_km, population,
                num_country, ai_model_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            ON CONFLICT (name) DO UPDATE SET
                description = EXCLUDED.description,
                area_sq_mile = EXCLUDED.area_sq_mile,
                area_sq_km = EXCLUDED.area_sq_km,
                population = EXCLUDED.population,
                num_country = EXCLUDED.num_country,
                ai_model_id = EXCLUDED.ai_model_id,
                updated_at = NOW()
            RETURNING continent_id::BIGINT
            "#,
        )
        .bind(&record.name)
        .bind(&record.description)
        .bind(record.area_sq_mile)
        .bind(record.area_sq_km)
        .bind(record.population)
        .bind(record.country_count)
        .bind(ai_model_id.0)
        .fetch_one(&self.pool)
        .await?;

        Ok(ContinentId(id))
    }

    async fn find_country_id(&self, name: &str) -> Result<Option<CountryId>, RepositoryError> {
        let id: Option<i64> = sqlx::query_scalar(
            "SELECT country_id::BIGINT FROM countries WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id.map(CountryId))
    }

    async fn upsert_country(
        &self,
        record: &CountryRecord,
        ai_model_id: AiModelId,
        continent_id: Option<ContinentId>,
    ) -> Result<CountryId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO countries (
                ai_model_id, continent_id, name, description, interesting_fact,
                area_sq_mile, area_sq_km, population, ppp, life_expectancy,
                travel_risk_level, global_peace_index_score, global_peace_index_rank,
                happiness_index_score, happiness_index_rank, gdp, gdp_growth_rate,
                inflation_rate, unemployment_rate, govt_debt, credit_rating,
                poverty_rate, gini_coefficient, military_spending, gdp_per_capita,
                created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, NOW(), NOW()
            )
            ON CONFLICT (name) DO UPDATE SET
                ai_model_id = EXCLUDED.ai_model_id,
                continent_id = EXCLUDED.continent_id,
                description = EXCLUDED.description,
                interesting_fact = EXCLUDED.interesting_fact,
                area_sq_mile = EXCLUDED.area_sq_mile,
                area_sq_km = EXCLUDED.area_sq_km,
                population = EXCLUDED.population,
                ppp = EXCLUDED.ppp,
                life_expectancy = EXCLUDED.life_expectancy,
                travel_risk_level = EXCLUDED.travel_risk_level,
                global_peace_index_score = EXCLUDED.global_peace_index_score,
                global_peace_index_rank = EXCLUDED.global_peace_index_rank,
                happiness_index_score = EXCLUDED.happiness_index_score,
                happiness_index_rank = EXCLUDED.happiness_index_rank,
                gdp = EXCLUDED.gdp,
                gdp_growth_rate = EXCLUDED.gdp_growth_rate,
                inflation_rate = EXCLUDED.inflation_rate,
                unemployment_rate = EXCLUDED.unemployment_rate,
                govt_debt = EXCLUDED.govt_debt,
                credit_rating = EXCLUDED.credit_rating,
                poverty_rate = EXCLUDED.poverty_rate,
                gini_coefficient = EXCLUDED.gini_coefficient,
                military_spending = EXCLUDED.military_spending,
                gdp_per_capita = EXCLUDED.gdp_per_capita,
                updated_at = NOW()
            RETURNING country_id::BIGINT
            "#,
        )
        .bind(ai_model_id.0)
        .bind(continent_id.map(|id| id.0))
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.interesting_fact)
        .bind(record.area_sq_mile)
        .bind(record.area_sq_km)
        .bind(record.population)
        .bind(record.ppp)
        .bind(record.life_expectancy)
        .bind(&record.travel_risk_level)
        .bind(record.global_peace_index_score)
        .bind(record.global_peace_index_rank)
        .bind(record.happiness_index_score)
        .bind(record.happiness_index_rank)
        .bind(record.gdp)
        .bind(record.gdp_growth_rate)
        .bind(record.inflation_rate)
        .bind(record.unemployment_rate)
        .bind(record.govt_debt)
        .bind(&record.credit_rating)
        .bind(record.poverty_rate)
        .bind(record.gini_coefficient)
        .bind(record.military_spending)
        .bind(record.gdp_per_capita)
        .fetch_one(&self.pool)
        .await?;

        Ok(CountryId(id))
    }

    async fn upsert_city(
        &self,
        record: &CityRecord,
        country_id: CountryId,
    ) -> Result<CityId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO cities (
                country_id, name, is_capital, description, interesting_fact,
                area_sq_mile, area_sq_km, population, sci_score, sci_rank,
                numbeo_si, numbeo_ci, airport_code, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW(), NOW())
            ON CONFLICT (country_id, name) DO UPDATE SET
                is_capital = EXCLUDED.is_capital,
                description = EXCLUDED.description,
                interesting_fact = EXCLUDED.interesting_fact,
                area_sq_mile = EXCLUDED.area_sq_mile,
                area_sq_km = EXCLUDED.area_sq_km,
                population = EXCLUDED.population,
                sci_score = EXCLUDED.sci_score,
                sci_rank = EXCLUDED.sci_rank,
                numbeo_si = EXCLUDED.numbeo_si,
                numbeo_ci = EXCLUDED.numbeo_ci,
                airport_code = EXCLUDED.airport_code,
                updated_at = NOW()
            RETURNING city_id::BIGINT
            "#,
        )
        .bind(country_id.0)
        .bind(&record.name)
        .bind(record.is_capital)
        .bind(&record.description)
        .bind(&record.interesting_fact)
        .bind(record.area_sq_mile)
        .bind(record.area_sq_km)
        .bind(record.population)
        .bind(record.sci_score)
        .bind(record.sci_rank)
        .bind(record.numbeo_si)
        .bind(record.numbeo_ci)
        .bind(&record.airport_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(CityId(id))
    }
}
