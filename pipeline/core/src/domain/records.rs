// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Normalized Records
//!
//! The uniform shapes every provider reply is validated into. All values are
//! stored as reported; plausibility (a Gini index of 105, a negative growth
//! rate) is never judged here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of geographic entity a provider is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Continent,
    Country,
    /// The most populous cities of one country. `subject` is the country name.
    Cities,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Continent => "continent",
            EntityKind::Country => "country",
            EntityKind::Cities => "cities",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continent" | "continents" => Ok(EntityKind::Continent),
            "country" | "countries" => Ok(EntityKind::Country),
            "cities" | "city" => Ok(EntityKind::Cities),
            other => Err(format!("unknown entity kind '{other}'")),
        }
    }
}

/// Which provider and model produced a record. Taken from adapter
/// configuration, never from the model's own output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelIdentity {
    pub provider: String,
    pub model_name: String,
}

impl ModelIdentity {
    pub fn new(provider: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_name: model_name.into(),
        }
    }
}

impl fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContinentRecord {
    #[serde(default)]
    pub name: String,
    pub description: String,
    pub area_sq_mile: f64,
    pub area_sq_km: f64,
    pub population: i64,
    #[serde(alias = "num_country")]
    pub country_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    #[serde(default)]
    pub name: String,
    /// Continent natural key. `None` persists the country without a continent link.
    #[serde(default)]
    pub continent: Option<String>,
    pub description: String,
    pub interesting_fact: String,
    pub area_sq_mile: f64,
    pub area_sq_km: f64,
    pub population: i64,
    pub ppp: f64,
    pub life_expectancy: f64,
    pub travel_risk_level: String,
    pub global_peace_index_score: f64,
    pub global_peace_index_rank: i64,
    pub happiness_index_score: f64,
    pub happiness_index_rank: i64,
    pub gdp: f64,
    pub gdp_growth_rate: f64,
    pub inflation_rate: f64,
    pub unemployment_rate: f64,
    pub govt_debt: f64,
    pub credit_rating: String,
    pub poverty_rate: f64,
    pub gini_coefficient: f64,
    pub military_spending: f64,
    #[serde(default)]
    pub gdp_per_capita: Option<f64>,
    #[serde(default)]
    pub provenance: ModelIdentity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub name: String,
    /// Owning country natural key.
    #[serde(default)]
    pub country: String,
    pub is_capital: bool,
    pub description: String,
    pub interesting_fact: String,
    pub area_sq_mile: f64,
    pub area_sq_km: f64,
    pub population: i64,
    #[serde(default)]
    pub sci_score: Option<f64>,
    #[serde(default)]
    pub sci_rank: Option<i64>,
    #[serde(default)]
    pub numbeo_si: Option<f64>,
    #[serde(default)]
    pub numbeo_ci: Option<f64>,
    #[serde(default)]
    pub airport_code: Option<String>,
}
