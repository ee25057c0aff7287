// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Prompt Assembly
//
// Builds the instruction text for each entity kind from the shared field
// tables, then shapes it for the provider's request style.

use crate::domain::fields::{fields_for, FieldSpec, MAX_CITIES};
use crate::domain::provider::{ProviderProfile, RequestShape};
use crate::domain::records::EntityKind;

use super::schema::tool_name;

pub const SYSTEM_PROMPT: &str = "You are a helpful geography assistant with accurate, current \
knowledge of world continents, countries and cities. Respond only with data in the exact JSON \
format requested.";

/// Messages ready to be placed on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    /// System and user text joined, for single-message providers.
    pub fn combined(&self) -> String {
        match &self.system {
            Some(system) => format!("{system}\n\n{}", self.user),
            None => self.user.clone(),
        }
    }
}

pub fn build_prompt(profile: &ProviderProfile, kind: EntityKind, subject: &str) -> Prompt {
    let prompt = match profile.shape {
        RequestShape::SystemAndUser => Prompt {
            system: Some(SYSTEM_PROMPT.to_string()),
            user: entity_prompt(kind, subject),
        },
        RequestShape::SingleUserMessage | RequestShape::ContentString => Prompt {
            system: None,
            user: format!("{SYSTEM_PROMPT}\n\n{}", entity_prompt(kind, subject)),
        },
        RequestShape::ToolCall => Prompt {
            system: Some(SYSTEM_PROMPT.to_string()),
            user: tool_prompt(kind, subject),
        },
    };
    Prompt {
        user: ensure_trigger_token(prompt.user, profile.trigger_token),
        ..prompt
    }
}

/// Append a sentence naming `token` unless the prompt already contains it
/// (case-insensitive).
pub fn ensure_trigger_token(prompt: String, token: Option<&str>) -> String {
    match token {
        Some(token) if !prompt.to_lowercase().contains(&token.to_lowercase()) => {
            format!("{prompt}\nRespond in {token} format.")
        }
        _ => prompt,
    }
}

pub fn entity_prompt(kind: EntityKind, subject: &str) -> String {
    let fields = field_list(fields_for(kind));
    match kind {
        EntityKind::Continent => format!(
            "Provide information about the continent of {subject}, covering the entire \
continental region including all sovereign nations within it. Return a JSON object with \
these fields:\n{fields}"
        ),
        EntityKind::Country => format!(
            "Provide current information about the country {subject}. Return a JSON object \
with these fields:\n{fields}"
        ),
        EntityKind::Cities => format!(
            "List the {MAX_CITIES} most populous cities in {subject}. Return a JSON object with \
a \"cities\" array. Each city has these fields:\n{fields}"
        ),
    }
}

fn tool_prompt(kind: EntityKind, subject: &str) -> String {
    let target = match kind {
        EntityKind::Continent => format!("the continent of {subject}"),
        EntityKind::Country => format!("the country {subject}"),
        EntityKind::Cities => format!("the {MAX_CITIES} most populous cities in {subject}"),
    };
    format!(
        "Record accurate, current information about {target} using the {} tool.",
        tool_name(kind)
    )
}

fn field_list(fields: &[FieldSpec]) -> String {
    fields
        .iter()
        .map(|field| {
            let nullable = if field.kind.is_optional() { " or null" } else { "" };
            match field.description {
                Some(desc) => {
                    format!("- {}: {}{nullable} ({desc})", field.name, field.kind.json_type())
                }
                None => format!("- {}: {}{nullable}", field.name, field.kind.json_type()),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::ProviderKind;

    #[test]
    fn trigger_token_is_appended_only_when_absent() {
        let appended = ensure_trigger_token("Describe Chad.".into(), Some("json"));
        assert!(appended.ends_with("Respond in json format."));

        let kept = ensure_trigger_token("Return a JSON object.".into(), Some("json"));
        assert_eq!(kept, "Return a JSON object.");

        assert_eq!(ensure_trigger_token("x".into(), None), "x");
    }

    #[test]
    fn single_message_shape_folds_system_prompt_into_user() {
        let prompt = build_prompt(&ProviderKind::DeepSeek.profile(), EntityKind::Country, "Chad");
        assert!(prompt.system.is_none());
        assert!(prompt.user.starts_with(SYSTEM_PROMPT));
        assert!(prompt.user.to_lowercase().contains("json"));
        assert!(prompt.user.contains("- gini_coefficient: number"));
    }

    #[test]
    fn tool_prompt_names_the_tool() {
        let prompt = build_prompt(&ProviderKind::Anthropic.profile(), EntityKind::Cities, "Chad");
        assert_eq!(prompt.system.as_deref(), Some(SYSTEM_PROMPT));
        assert!(prompt.user.contains("record_cities_info"));
    }

    #[test]
    fn optional_fields_are_marked_nullable() {
        let prompt = entity_prompt(EntityKind::Cities, "Chad");
        assert!(prompt.contains("- sci_rank: integer or null"));
        assert!(prompt.contains("\"cities\" array"));
    }
}
