// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI-Compatible Chat Completions Adapter
//
// Anti-Corruption Layer for the chat completions dialect shared by OpenAI,
// DeepSeek, Groq, Mistral and AI21. The providers differ only in message
// layout and in which `response_format` they honour, both read from the
// provider profile.

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
use super::schema::{entity_schema, schema_name};

pub struct OpenAiCompatibleAdapter {
    client: reqwest::Client,
    profile: ProviderProfile,
    settings: ProviderSettings,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseFormat {
    JsonObject,
    JsonSchema { json_schema: NamedSchema },
}

#[derive(Serialize)]
struct NamedSchema {
    name: &'static str,
    strict: bool,
    schema: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleAdapter {
    pub fn new(settings: ProviderSettings) -> Result<Self, ConfigError> {
        let client = build_client(settings.timeout)?;
        Ok(Self {
            client,
            profile: settings.kind.profile(),
            settings,
        })
    }

    fn build_request(&self, kind: EntityKind, subject: &str) -> ChatRequest {
        let prompt = build_prompt(&self.profile, kind, subject);
        let messages = match prompt.system {
            Some(system) => vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt.user },
            ],
            None => vec![ChatMessage { role: "user", content: prompt.user }],
        };

        let response_format = if self.profile.schema.attach {
            ResponseFormat::JsonSchema {
                json_schema: NamedSchema {
                    name: schema_name(kind),
                    strict: self.profile.schema.strict,
                    schema: entity_schema(kind, &self.profile.schema),
                },
            }
        } else {
            ResponseFormat::JsonObject
        };

        ChatRequest {
            model: self.settings.model.clone(),
            messages,
            response_format,
            temperature: 0.2,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn kind(&self) -> ProviderKind {
        self.settings.kind
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
        let url = format!("{}/chat/completions", self.settings.endpoint);
        debug!(provider = %self.settings.kind, %kind, subject, "requesting chat completion");

        let response: ChatResponse = send_json(
            self.client
                .post(&url)
                .bearer_auth(&self.settings.api_key)
                .json(&request),
        )
        .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("response has no choices".into()))?;

        Ok(RawResponse::text(
            self.settings.kind,
            self.profile.tier,
            choice.message.content.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(kind: ProviderKind) -> OpenAiCompatibleAdapter {
        OpenAiCompatibleAdapter::new(ProviderSettings::with_defaults(kind, "key")).unwrap()
    }

    #[test]
    fn openai_requests_strict_json_schema() {
        let request = adapter(ProviderKind::OpenAi).build_request(EntityKind::Country, "Chad");
        let body = serde_json::to_value(request).unwrap();
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "country_info");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["model"], "gpt-4o");
    }

    #[test]
    fn deepseek_sends_one_user_message_in_json_mode() {
        let request = adapter(ProviderKind::DeepSeek).build_request(EntityKind::Cities, "Chad");
        let body = serde_json::to_value(request).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert!(messages[0]["content"].as_str().unwrap().to_lowercase().contains("json"));
        assert_eq!(body["response_format"], serde_json::json!({"type": "json_object"}));
    }

    #[test]
    fn identity_uses_configured_model() {
        let settings = ProviderSettings::with_defaults(ProviderKind::Groq, "key")
            .model("llama-3.3-70b-versatile");
        let adapter = OpenAiCompatibleAdapter::new(settings).unwrap();
        assert_eq!(
            adapter.fetch_identity(),
            ModelIdentity::new("Groq", "llama-3.3-70b-versatile")
        );
    }
}
