// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Field Tables
//!
//! One table per entity kind. Prompts, outbound JSON schemas and inbound
//! coercion are all derived from these tables so the three never drift.
//!
//! Bounds are always inclusive. Several providers reject exclusive-bound
//! keywords outright, so a "strictly positive" area is expressed as `minimum: 0`.

use crate::domain::records::EntityKind;

/// Most populous cities kept per country.
pub const MAX_CITIES: usize = 5;

/// Free-text fields longer than this are truncated on ingest.
pub const MAX_TEXT_CHARS: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Integer,
    Boolean,
    OptionalText,
    OptionalNumber,
    OptionalInteger,
}

impl FieldKind {
    pub const fn is_optional(&self) -> bool {
        matches!(
            self,
            FieldKind::OptionalText | FieldKind::OptionalNumber | FieldKind::OptionalInteger
        )
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldKind::Number
                | FieldKind::Integer
                | FieldKind::OptionalNumber
                | FieldKind::OptionalInteger
        )
    }

    /// JSON-schema base type name.
    pub const fn json_type(&self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::OptionalText => "string",
            FieldKind::Number | FieldKind::OptionalNumber => "number",
            FieldKind::Integer | FieldKind::OptionalInteger => "integer",
            FieldKind::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: Option<&'static str>,
    /// Listed under `required` in outbound schemas.
    pub required: bool,
    /// Structurally mandatory: a record without it cannot be keyed.
    pub key: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub max_length: Option<usize>,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            description: None,
            required: !kind.is_optional(),
            key: false,
            minimum: None,
            maximum: None,
            max_length: None,
        }
    }

    const fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    const fn key(mut self) -> Self {
        self.key = true;
        self.required = true;
        self
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn at_least(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    const fn between(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    const fn max_len(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

use FieldKind::*;

pub const CONTINENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("description", Text)
        .describe("brief description of the continent, MUST be under 250 characters")
        .max_len(MAX_TEXT_CHARS),
    FieldSpec::new("area_sq_mile", Number).at_least(0.0),
    FieldSpec::new("area_sq_km", Number).at_least(0.0),
    FieldSpec::new("population", Integer).at_least(0.0),
    FieldSpec::new("num_country", Integer)
        .describe("total number of sovereign nations in the continental region")
        .at_least(0.0),
];

pub const COUNTRY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("description", Text)
        .describe("brief description of the country, MUST be under 250 characters")
        .max_len(MAX_TEXT_CHARS),
    FieldSpec::new("interesting_fact", Text)
        .describe("one interesting fact, MUST be under 250 characters")
        .max_len(MAX_TEXT_CHARS),
    FieldSpec::new("area_sq_mile", Number).at_least(0.0),
    FieldSpec::new("area_sq_km", Number).at_least(0.0),
    FieldSpec::new("population", Integer).at_least(0.0),
    FieldSpec::new("ppp", Number)
        .describe("purchasing power parity per capita in USD")
        .at_least(0.0),
    FieldSpec::new("life_expectancy", Number).between(0.0, 150.0),
    FieldSpec::new("travel_risk_level", Text)
        .describe("US State Department advisory formatted 'Level X: Description' where X is 1-4")
        .max_len(50),
    FieldSpec::new("global_peace_index_score", Number).at_least(0.0),
    FieldSpec::new("global_peace_index_rank", Integer).at_least(1.0),
    FieldSpec::new("happiness_index_score", Number).at_least(0.0),
    FieldSpec::new("happiness_index_rank", Integer).at_least(1.0),
    FieldSpec::new("gdp", Number).describe("in USD").at_least(0.0),
    FieldSpec::new("gdp_growth_rate", Number).describe("in %"),
    FieldSpec::new("inflation_rate", Number).describe("in %"),
    FieldSpec::new("unemployment_rate", Number).describe("in %").at_least(0.0),
    FieldSpec::new("govt_debt", Number).describe("in % of GDP").at_least(0.0),
    FieldSpec::new("credit_rating", Text)
        .describe("S&P rating")
        .max_len(10),
    FieldSpec::new("poverty_rate", Number).describe("in %").at_least(0.0),
    FieldSpec::new("gini_coefficient", Number).between(0.0, 100.0),
    FieldSpec::new("military_spending", Number)
        .describe("in % of GDP")
        .at_least(0.0),
    FieldSpec::new("gdp_per_capita", OptionalNumber)
        .describe("in USD")
        .at_least(0.0),
];

pub const CITY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", Text).key().max_len(100),
    FieldSpec::new("is_capital", Boolean),
    FieldSpec::new("description", Text)
        .describe("brief description of the city, MUST be under 250 characters")
        .max_len(MAX_TEXT_CHARS),
    FieldSpec::new("interesting_fact", Text)
        .describe("one interesting fact, MUST be under 250 characters")
        .max_len(MAX_TEXT_CHARS),
    FieldSpec::new("area_sq_mile", Number).at_least(0.0),
    FieldSpec::new("area_sq_km", Number).at_least(0.0),
    FieldSpec::new("population", Integer).at_least(0.0),
    FieldSpec::new("sci_score", OptionalNumber)
        .describe("safety/crime index score")
        .between(0.0, 100.0),
    FieldSpec::new("sci_rank", OptionalInteger).at_least(1.0),
    FieldSpec::new("numbeo_si", OptionalNumber)
        .describe("Numbeo safety index")
        .between(0.0, 100.0),
    FieldSpec::new("numbeo_ci", OptionalNumber)
        .describe("Numbeo crime index")
        .between(0.0, 100.0),
    FieldSpec::new("airport_code", OptionalText)
        .describe("3-letter IATA code of the main airport")
        .required()
        .max_len(3),
];

/// Field table for a single record of `kind`.
pub fn fields_for(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::Continent => CONTINENT_FIELDS,
        EntityKind::Country => COUNTRY_FIELDS,
        EntityKind::Cities => CITY_FIELDS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_name_is_the_only_key_field() {
        let keys: Vec<_> = CITY_FIELDS.iter().filter(|f| f.key).map(|f| f.name).collect();
        assert_eq!(keys, vec!["name"]);
        assert!(COUNTRY_FIELDS.iter().all(|f| !f.key));
    }

    #[test]
    fn optional_fields_are_not_required_unless_marked() {
        let gdp_per_capita = COUNTRY_FIELDS
            .iter()
            .find(|f| f.name == "gdp_per_capita")
            .unwrap();
        assert!(!gdp_per_capita.required);
        let airport = CITY_FIELDS.iter().find(|f| f.name == "airport_code").unwrap();
        assert!(airport.required && airport.kind.is_optional());
    }

    #[test]
    fn bounds_are_ordered() {
        for field in CONTINENT_FIELDS.iter().chain(COUNTRY_FIELDS).chain(CITY_FIELDS) {
            if let (Some(min), Some(max)) = (field.minimum, field.maximum) {
                assert!(min <= max, "{} has inverted bounds", field.name);
            }
        }
    }
}
