// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Outbound Response Schemas
//
// Renders the field tables into the JSON schema dialect each provider accepts.
// Only inclusive `minimum`/`maximum` are ever emitted; `maxLength`, bounds and
// strict-mode requirements are switched per provider by `SchemaSupport`.

use serde_json::{json, Map, Value};

use crate::domain::fields::{fields_for, FieldKind, FieldSpec, MAX_CITIES};
use crate::domain::provider::{SchemaDialect, SchemaSupport};
use crate::domain::records::EntityKind;

pub fn tool_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Continent => "record_continent_info",
        EntityKind::Country => "record_country_info",
        EntityKind::Cities => "record_cities_info",
    }
}

/// Name used for OpenAI's `json_schema.name`.
pub fn schema_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Continent => "continent_info",
        EntityKind::Country => "country_info",
        EntityKind::Cities => "cities_info",
    }
}

/// Full response schema for `kind`. Cities are wrapped as `{"cities": [...]}`.
pub fn entity_schema(kind: EntityKind, support: &SchemaSupport) -> Value {
    let record = object_schema(fields_for(kind), support);
    match kind {
        EntityKind::Continent | EntityKind::Country => record,
        EntityKind::Cities => {
            let mut array = Map::new();
            array.insert("type".into(), type_name("array", support.dialect));
            array.insert("items".into(), record);
            if support.bounds {
                array.insert("maxItems".into(), json!(MAX_CITIES));
            }
            let mut properties = Map::new();
            properties.insert("cities".into(), Value::Object(array));
            wrap_object(properties, vec!["cities"], support)
        }
    }
}

pub fn tool_definition(kind: EntityKind, support: &SchemaSupport) -> Value {
    let description = match kind {
        EntityKind::Continent => "Record continent information",
        EntityKind::Country => "Record country information",
        EntityKind::Cities => "Record information about a country's most populous cities",
    };
    json!({
        "name": tool_name(kind),
        "description": description,
        "input_schema": entity_schema(kind, support),
    })
}

pub fn object_schema(fields: &[FieldSpec], support: &SchemaSupport) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name.to_string(), property_schema(field, support));
        if field.required || support.strict {
            required.push(field.name);
        }
    }
    wrap_object(properties, required, support)
}

fn wrap_object(
    properties: Map<String, Value>,
    required: Vec<&str>,
    support: &SchemaSupport,
) -> Value {
    let mut object = Map::new();
    object.insert("type".into(), type_name("object", support.dialect));
    object.insert("properties".into(), Value::Object(properties));
    object.insert("required".into(), json!(required));
    if support.strict {
        object.insert("additionalProperties".into(), Value::Bool(false));
    }
    Value::Object(object)
}

fn property_schema(field: &FieldSpec, support: &SchemaSupport) -> Value {
    let mut property = Map::new();
    let base = field.kind.json_type();
    match (support.dialect, field.kind.is_optional()) {
        (SchemaDialect::JsonSchema, true) => {
            property.insert("type".into(), json!([base, "null"]));
        }
        (SchemaDialect::JsonSchema, false) => {
            property.insert("type".into(), json!(base));
        }
        (SchemaDialect::OpenApi, optional) => {
            property.insert("type".into(), type_name(base, SchemaDialect::OpenApi));
            if optional {
                property.insert("nullable".into(), Value::Bool(true));
            }
        }
    }
    if let Some(description) = field.description {
        property.insert("description".into(), json!(description));
    }
    if support.max_length && matches!(field.kind, FieldKind::Text | FieldKind::OptionalText) {
        if let Some(max) = field.max_length {
            property.insert("maxLength".into(), json!(max));
        }
    }
    if support.bounds && field.kind.is_numeric() {
        if let Some(min) = field.minimum {
            property.insert("minimum".into(), bound(min, field.kind));
        }
        if let Some(max) = field.maximum {
            property.insert("maximum".into(), bound(max, field.kind));
        }
    }
    Value::Object(property)
}

fn bound(value: f64, kind: FieldKind) -> Value {
    if matches!(kind, FieldKind::Integer | FieldKind::OptionalInteger) {
        json!(value as i64)
    } else {
        json!(value)
    }
}

fn type_name(name: &str, dialect: SchemaDialect) -> Value {
    match dialect {
        SchemaDialect::JsonSchema => json!(name),
        SchemaDialect::OpenApi => json!(name.to_ascii_uppercase()),
    }
}
