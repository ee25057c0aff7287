// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Cohere Chat Adapter
//
// Anti-Corruption Layer for the Cohere v2 chat API. JSON mode with an
// attached schema; Cohere rejects `maxLength`, which the profile's schema
// support switches off.

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

pub struct CohereAdapter {
    client: reqwest::Client,
    profile: ProviderProfile,
    settings: ProviderSettings,
}

#[derive(Serialize)]
struct CohereRequest {
    model: String,
    messages: Vec<CohereMessage>,
    response_format: CohereResponseFormat,
    temperature: f32,
}

#[derive(Serialize)]
struct CohereMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct CohereResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: Value,
}

#[derive(Deserialize)]
struct CohereResponse {
    message: Option<CohereResponseMessage>,
}

#[derive(Deserialize)]
struct CohereResponseMessage {
    #[serde(default)]
    content: Vec<CohereContent>,
}

#[derive(Deserialize)]
struct CohereContent {
    #[serde(default)]
    text: String,
}

impl CohereAdapter {
    pub fn new(settings: ProviderSettings) -> Result<Self, ConfigError> {
        let client = build_client(settings.timeout)?;
        Ok(Self {
            client,
            profile: settings.kind.profile(),
            settings,
        })
    }

    fn build_request(&self, kind: EntityKind, subject: &str) -> CohereRequest {
        let prompt = build_prompt(&self.profile, kind, subject);
        CohereRequest {
            model: self.settings.model.clone(),
            messages: vec![CohereMessage {
                role: "user",
                content: prompt.combined(),
            }],
            response_format: CohereResponseFormat {
                format_type: "json_object",
                json_schema: entity_schema(kind, &self.profile.schema),
            },
            temperature: 0.2,
        }
    }
}

#[async_trait]
impl ProviderAdapter for CohereAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cohere
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
        let url = format!("{}/v2/chat", self.settings.endpoint);
        debug!(%kind, subject, "requesting cohere chat");

        let response: CohereResponse = send_json(
            self.client
                .post(&url)
                .bearer_auth(&self.settings.api_key)
                .json(&request),
        )
        .await?;

        let message = response
            .message
            .ok_or_else(|| ProviderError::MalformedResponse("response has no message".into()))?;
        let text: String = message.content.into_iter().map(|c| c.text).collect();

        Ok(RawResponse::text(ProviderKind::Cohere, self.profile.tier, text))
    }
}
