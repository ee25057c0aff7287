// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures: a scripted provider adapter and canned payloads.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use atlas_core::domain::provider::{
    EnforcementTier, ProviderAdapter, ProviderError, ProviderKind, RawResponse, RetryPolicy,
};
use atlas_core::domain::records::{EntityKind, ModelIdentity};

type Script = dyn Fn(EntityKind, &str, u32) -> Result<String, ProviderError> + Send + Sync;

/// Answers from a closure given `(kind, subject, attempt)`, attempt being
/// 1-based per `(kind, subject)`.
pub struct ScriptedAdapter {
    kind: ProviderKind,
    tier: EnforcementTier,
    policy: RetryPolicy,
    script: Box<Script>,
    calls: Mutex<HashMap<(EntityKind, String), u32>>,
}

impl ScriptedAdapter {
    pub fn new<F>(kind: ProviderKind, tier: EnforcementTier, script: F) -> Self
    where
        F: Fn(EntityKind, &str, u32) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            kind,
            tier,
            policy: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(10),
                rate_limit_delay: None,
            },
            script: Box::new(script),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn calls(&self, kind: EntityKind, subject: &str) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(&(kind, subject.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn fetch_identity(&self) -> ModelIdentity {
        ModelIdentity::new(self.kind.profile().display_name, "scripted-model")
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    async fn fetch_entity(
        &self,
        kind: EntityKind,
        subject: &str,
    ) -> Result<RawResponse, ProviderError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry((kind, subject.to_string())).or_insert(0);
            *count += 1;
            *count
        };
        let text = (self.script)(kind, subject, attempt)?;
        Ok(RawResponse::text(self.kind, self.tier, text))
    }
}

pub fn country_payload(population: u64) -> Value {
    json!({
        "description": "Most populous country in Africa.",
        "interesting_fact": "Home to over 500 languages.",
        "area_sq_mile": 356669,
        "area_sq_km": 923768,
        "population": population,
        "ppp": 5860,
        "life_expectancy": 54.7,
        "travel_risk_level": "Level 3: Reconsider Travel",
        "global_peace_index_score": 2.8,
        "global_peace_index_rank": 147,
        "happiness_index_score": 4.98,
        "happiness_index_rank": 102,
        "gdp": 477400000000.0,
        "gdp_growth_rate": 2.9,
        "inflation_rate": 24.5,
        "unemployment_rate": 5.0,
        "govt_debt": 38.0,
        "credit_rating": "B-",
        "poverty_rate": 40.1,
        "gini_coefficient": 35.1,
        "military_spending": 0.7
    })
}

pub fn continent_payload() -> Value {
    json!({
        "description": "Second-largest continent.",
        "area_sq_mile": 11700000,
        "area_sq_km": 30370000,
        "population": 1400000000,
        "num_country": 54
    })
}

pub fn city(name: &str, population: u64, capital: bool) -> Value {
    json!({
        "name": name,
        "is_capital": capital,
        "description": format!("{name} is a major city."),
        "interesting_fact": "It is large.",
        "area_sq_mile": 452,
        "area_sq_km": 1171,
        "population": population,
        "sci_score": null,
        "sci_rank": null,
        "numbeo_si": 40.2,
        "numbeo_ci": 59.8,
        "airport_code": "LOS"
    })
}

pub fn nigeria_cities() -> Value {
    json!({
        "cities": [
            city("Lagos", 15_400_000, false),
            city("Kano", 4_100_000, false),
            city("Ibadan", 3_600_000, false),
            city("Abuja", 3_800_000, true),
            city("Port Harcourt", 3_300_000, false)
        ]
    })
}
