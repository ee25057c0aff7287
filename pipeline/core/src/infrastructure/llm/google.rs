// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Google Gemini Adapter
//
// Anti-Corruption Layer for the Gemini `generateContent` API. The prompt goes
// out as a plain content string; `generationConfig` carries the JSON MIME type
// and an OpenAPI-dialect response schema.

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
use super::schema::entity_schema;

pub struct GoogleAdapter {
    client: reqwest::Client,
    profile: ProviderProfile,
    settings: ProviderSettings,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GoogleAdapter {
    pub fn new(settings: ProviderSettings) -> Result<Self, ConfigError> {
        let client = build_client(settings.timeout)?;
        Ok(Self {
            client,
            profile: settings.kind.profile(),
            settings,
        })
    }

    fn build_request(&self, kind: EntityKind, subject: &str) -> GenerateRequest {
        let prompt = build_prompt(&self.profile, kind, subject);
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.combined(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: entity_schema(kind, &self.profile.schema),
                temperature: 0.2,
            },
        }
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
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
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.endpoint, self.settings.model
        );
        debug!(%kind, subject, "requesting gemini content");

        let response: GenerateResponse = send_json(
            self.client
                .post(&url)
                .header("x-goog-api-key", &self.settings.api_key)
                .json(&request),
        )
        .await?;

        // A blocked or empty candidate list surfaces as an empty payload
        // and is retried like any other blank reply.
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Ok(RawResponse::text(ProviderKind::Google, self.profile.tier, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_mime_type_and_schema() {
        let settings = ProviderSettings::with_defaults(ProviderKind::Google, "key");
        let adapter = GoogleAdapter::new(settings).unwrap();
        let body =
            serde_json::to_value(adapter.build_request(EntityKind::Continent, "Africa")).unwrap();
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("continent of Africa"));
    }
}
