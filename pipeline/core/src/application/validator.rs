// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Schema Validator
//!
//! Turns a [`RawResponse`] into typed records. Text payloads are sanitized and
//! decoded first; typed payloads (tool calls) skip straight to field checks.
//!
//! How strict the field checks are depends on the provider's
//! [`EnforcementTier`]:
//!
//! | Tier | Missing non-key field | Uncoercible value |
//! |------|-----------------------|-------------------|
//! | `None`, `JsonOnly` | zero value | violation |
//! | `Enforced`, `Strict` | violation if schema-required | violation |
//!
//! Values are coerced (numeric strings, rounded integers) but never clamped:
//! whatever the provider reported is what gets stored. Self-identification
//! fields in the payload are ignored; provenance always comes from the adapter.

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::application::sanitizer::{extract_json_slice, sanitize};
use crate::domain::error::SchemaViolationError;
use crate::domain::fields::{
    FieldKind, FieldSpec, CITY_FIELDS, CONTINENT_FIELDS, COUNTRY_FIELDS, MAX_CITIES,
};
use crate::domain::provider::{EnforcementTier, Payload, RawResponse};
use crate::domain::records::{CityRecord, ContinentRecord, CountryRecord, ModelIdentity};

const ROOT: &str = "$";

pub fn validate_continent(
    response: &RawResponse,
    name: &str,
) -> Result<ContinentRecord, SchemaViolationError> {
    let entity = format!("continent {name}");
    let value = decode(response, &entity)?;
    let object = expect_object(&value, &entity, ROOT)?;
    let mut record: ContinentRecord = build(object, CONTINENT_FIELDS, response.tier, &entity, "")?;
    record.name = name.to_string();
    Ok(record)
}

pub fn validate_country(
    response: &RawResponse,
    name: &str,
    continent: Option<&str>,
    identity: &ModelIdentity,
) -> Result<CountryRecord, SchemaViolationError> {
    let entity = format!("country {name}");
    let value = decode(response, &entity)?;
    let object = expect_object(&value, &entity, ROOT)?;
    let mut record: CountryRecord = build(object, COUNTRY_FIELDS, response.tier, &entity, "")?;
    record.name = name.to_string();
    record.continent = continent.map(str::to_string);
    record.provenance = identity.clone();
    Ok(record)
}

/// Accepts `{"cities": [...]}` or a bare array. Keeps the first five.
pub fn validate_cities(
    response: &RawResponse,
    country: &str,
) -> Result<Vec<CityRecord>, SchemaViolationError> {
    let entity = format!("cities of {country}");
    let value = decode(response, &entity)?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("cities") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(SchemaViolationError::new(
                    entity,
                    "expected a 'cities' array",
                    vec!["cities".into()],
                ))
            }
        },
        _ => {
            return Err(SchemaViolationError::new(
                entity,
                "expected an object or array",
                vec![ROOT.into()],
            ))
        }
    };

    let mut seen = HashSet::new();
    let unique: Vec<&Value> = items
        .iter()
        .filter(|item| city_key(item).is_none_or(|key| seen.insert(key)))
        .collect();
    if unique.len() < items.len() {
        warn!(country, repeated = items.len() - unique.len(), "dropping repeated city names");
    }
    if unique.len() > MAX_CITIES {
        warn!(country, returned = unique.len(), kept = MAX_CITIES, "truncating city list");
    }

    let mut offending = Vec::new();
    let mut cities = Vec::new();
    for (index, item) in unique.into_iter().take(MAX_CITIES).enumerate() {
        let path = format!("cities[{index}]");
        let Some(object) = item.as_object() else {
            offending.push(path);
            continue;
        };
        let prefix = format!("{path}.");
        let coerced = coerce_object(object, CITY_FIELDS, response.tier, &prefix, &mut offending);
        if let Some(mut city) = finish::<CityRecord>(coerced, &entity, &path, &mut offending) {
            city.country = country.to_string();
            city.airport_code = normalize_airport_code(city.airport_code.take());
            cities.push(city);
        }
    }

    if offending.is_empty() {
        Ok(cities)
    } else {
        Err(SchemaViolationError::new(entity, "invalid city entries", offending))
    }
}

/// Natural key of a raw city entry, compared case-insensitively.
fn city_key(item: &Value) -> Option<String> {
    let name = item.get("name")?.as_str()?.trim();
    (!name.is_empty()).then(|| name.to_lowercase())
}

fn decode(response: &RawResponse, entity: &str) -> Result<Value, SchemaViolationError> {
    let text = match &response.payload {
        Payload::Typed(value) => return Ok(value.clone()),
        Payload::Text(text) => text,
    };

    let cleaned = sanitize(text);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => Ok(value),
        Err(err) => {
            if response.provider.profile().extract_embedded_json {
                if let Some(value) = extract_json_slice(&cleaned)
                    .and_then(|slice| serde_json::from_str(slice).ok())
                {
                    debug!(
                        entity,
                        provider = %response.provider,
                        "decoded JSON embedded in free text"
                    );
                    return Ok(value);
                }
            }
            Err(SchemaViolationError::new(
                entity,
                format!("response is not valid JSON: {err}"),
                vec![ROOT.into()],
            ))
        }
    }
}

fn expect_object<'a>(
    value: &'a Value,
    entity: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, SchemaViolationError> {
    value.as_object().ok_or_else(|| {
        SchemaViolationError::new(entity, "expected a JSON object", vec![path.to_string()])
    })
}

fn build<T: DeserializeOwned>(
    object: &Map<String, Value>,
    fields: &[FieldSpec],
    tier: EnforcementTier,
    entity: &str,
    prefix: &str,
) -> Result<T, SchemaViolationError> {
    let mut offending = Vec::new();
    let coerced = coerce_object(object, fields, tier, prefix, &mut offending);
    let record = finish(coerced, entity, ROOT, &mut offending);
    match record {
        Some(record) if offending.is_empty() => Ok(record),
        _ => Err(SchemaViolationError::new(
            entity,
            "fields missing or of the wrong type",
            offending,
        )),
    }
}

fn finish<T: DeserializeOwned>(
    coerced: Option<Map<String, Value>>,
    entity: &str,
    path: &str,
    offending: &mut Vec<String>,
) -> Option<T> {
    let map = coerced?;
    match serde_json::from_value(Value::Object(map)) {
        Ok(record) => Some(record),
        Err(err) => {
            debug!(entity, error = %err, "coerced record failed to deserialize");
            offending.push(path.to_string());
            None
        }
    }
}

/// Coerce every field in `fields` out of `object`. Returns `None` if any
/// field was pushed onto `offending`.
fn coerce_object(
    object: &Map<String, Value>,
    fields: &[FieldSpec],
    tier: EnforcementTier,
    prefix: &str,
    offending: &mut Vec<String>,
) -> Option<Map<String, Value>> {
    let before = offending.len();
    let mut out = Map::with_capacity(fields.len());

    for spec in fields {
        let present = object.get(spec.name).filter(|v| !is_null_like(v));
        let coerced = match present {
            Some(value) => coerce_value(spec, value),
            None if spec.kind.is_optional() => Some(Value::Null),
            None if spec.key => None,
            None if tier.is_lenient() || !spec.required => Some(zero_value(spec.kind)),
            None => None,
        };
        match coerced {
            Some(value) => {
                out.insert(spec.name.to_string(), value);
            }
            None => offending.push(format!("{prefix}{}", spec.name)),
        }
    }

    (offending.len() == before).then_some(out)
}

fn is_null_like(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "null" | "none" | "n/a" | "unknown"
        ),
        _ => false,
    }
}

fn zero_value(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Text => Value::String(String::new()),
        FieldKind::Number => Value::from(0.0),
        FieldKind::Integer => Value::from(0),
        FieldKind::Boolean => Value::Bool(false),
        FieldKind::OptionalText | FieldKind::OptionalNumber | FieldKind::OptionalInteger => {
            Value::Null
        }
    }
}

fn coerce_value(spec: &FieldSpec, value: &Value) -> Option<Value> {
    match spec.kind {
        FieldKind::Text | FieldKind::OptionalText => {
            let text = match value {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some(Value::String(match spec.max_length {
                Some(max) if spec.kind == FieldKind::Text => truncate_chars(&text, max),
                _ => text,
            }))
        }
        FieldKind::Number | FieldKind::OptionalNumber => {
            let number = as_f64(value)?;
            Number::from_f64(number).map(Value::Number)
        }
        FieldKind::Integer | FieldKind::OptionalInteger => {
            if let Some(int) = value.as_i64() {
                return Some(Value::from(int));
            }
            let rounded = as_f64(value)?.round();
            (rounded.abs() < i64::MAX as f64).then(|| Value::from(rounded as i64))
        }
        FieldKind::Boolean => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(Value::Bool(true)),
                "false" | "no" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
    }
}

/// Finite f64 from a JSON number or a numeric string such as `"1,234.5"`,
/// `"$12"` or `"3.4%"`.
fn as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
            let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed);
            let digits: String = trimmed.chars().filter(|c| !matches!(c, ',' | '_')).collect();
            digits.trim().parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Longer than `max` characters → first `max - 3` characters plus `...`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str("...");
    truncated
}

/// Three ASCII letters, upper-cased; anything else is dropped.
pub fn normalize_airport_code(code: Option<String>) -> Option<String> {
    let code = code?.trim().to_ascii_uppercase();
    (code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())).then_some(code)
}
