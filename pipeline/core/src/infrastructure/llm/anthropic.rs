// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Anthropic Messages Adapter
//
// Anti-Corruption Layer for the Anthropic Messages API. Structured output is
// obtained by forcing a single tool call whose input schema is the record
// schema; the tool arguments arrive already typed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::config::{ConfigError, ProviderSettings};
use crate::domain::provider::{
    ProviderAdapter, ProviderError, ProviderKind, ProviderProfile, RawResponse, RetryPolicy,
};
use crate::domain::records::{EntityKind, ModelIdentity};

use super::http::{build_client, send_json};
use super::prompts::build_prompt;
use super::schema::{tool_definition, tool_name};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter {
    client: reqwest::Client,
    profile: ProviderProfile,
    settings: ProviderSettings,
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    tools: Vec<Value>,
    tool_choice: ToolChoice,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: &'static str,
    name: &'static str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ToolUse { name: String, input: Value },
    #[serde(other)]
    Other,
}

impl AnthropicAdapter {
    pub fn new(settings: ProviderSettings) -> Result<Self, ConfigError> {
        let client = build_client(settings.timeout)?;
        Ok(Self {
            client,
            profile: settings.kind.profile(),
            settings,
        })
    }

    fn build_request(&self, kind: EntityKind, subject: &str) -> AnthropicRequest {
        let prompt = build_prompt(&self.profile, kind, subject);
        AnthropicRequest {
            model: self.settings.model.clone(),
            max_tokens: max_tokens(kind),
            system: prompt.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt.user,
            }],
            tools: vec![tool_definition(kind, &self.profile.schema)],
            tool_choice: ToolChoice {
                choice_type: "tool",
                name: tool_name(kind),
            },
        }
    }
}

fn max_tokens(kind: EntityKind) -> u32 {
    match kind {
        EntityKind::Continent => 1024,
        EntityKind::Country => 2048,
        EntityKind::Cities => 4096,
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn fetch_identity(&self) -> ModelIdentity {
        ModelIdentity::new(self.profile.display_name, self.settings.model.clone())
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.settings.retry
    }

    async fn fetch_entity(
        &self,
        kind: EntityKind,
        subject: &str,
    ) -> Result<RawResponse, ProviderError> {
        let request = self.build_request(kind, subject);
        let url = format!("{}/v1/messages", self.settings.endpoint);
        debug!(%kind, subject, "requesting anthropic tool call");

        let response: AnthropicResponse = send_json(
            self.client
                .post(&url)
                .header("x-api-key", &self.settings.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request),
        )
        .await?;

        let expected = tool_name(kind);
        let input = response
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::ToolUse { name, input } if name == expected => Some(input),
                _ => None,
            })
            .ok_or_else(|| {
                ProviderError::MalformedResponse(format!("no {expected} tool call in response"))
            })?;

        Ok(RawResponse::typed(ProviderKind::Anthropic, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_forces_the_record_tool() {
        let settings = ProviderSettings::with_defaults(ProviderKind::Anthropic, "key");
        let adapter = AnthropicAdapter::new(settings).unwrap();
        let request = adapter.build_request(EntityKind::Country, "Chad");
        let body = serde_json::to_value(request).unwrap();
        assert_eq!(
            body["tool_choice"],
            serde_json::json!({"type": "tool", "name": "record_country_info"})
        );
        assert_eq!(body["tools"][0]["name"], "record_country_info");
        assert_eq!(body["model"], "claude-haiku-4-5");
        assert!(body["system"].is_string());
    }

    #[test]
    fn unknown_content_blocks_are_tolerated() {
        let response: AnthropicResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "text", "text": "Recording now."},
                {
                    "type": "tool_use",
                    "id": "toolu_1",
                    "name": "record_country_info",
                    "input": {"population": 5}
                }
            ]
        }))
        .unwrap();
        assert!(matches!(response.content[0], ContentBlock::Other));
        assert!(matches!(response.content[1], ContentBlock::ToolUse { .. }));
    }
}
