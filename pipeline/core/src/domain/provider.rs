// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Provider Contract
//!
//! Every provider integration is a [`ProviderAdapter`]. Adapters differ in
//! request shape, structured-output support and rate-limit behaviour; those
//! differences live in a static [`ProviderProfile`] per [`ProviderKind`] so the
//! rest of the pipeline never branches on provider names.
//!
//! An adapter performs exactly one network call per `fetch_entity`. Retries
//! belong to the retry coordinator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::error::ErrorKind;
use crate::domain::records::{EntityKind, ModelIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ai21,
    Anthropic,
    Cohere,
    DeepSeek,
    Google,
    Groq,
    Mistral,
    OpenAi,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 8] = [
        ProviderKind::Ai21,
        ProviderKind::Anthropic,
        ProviderKind::Cohere,
        ProviderKind::DeepSeek,
        ProviderKind::Google,
        ProviderKind::Groq,
        ProviderKind::Mistral,
        ProviderKind::OpenAi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ai21 => "ai21",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Cohere => "cohere",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Google => "google",
            ProviderKind::Groq => "groq",
            ProviderKind::Mistral => "mistral",
            ProviderKind::OpenAi => "openai",
        }
    }

    pub fn profile(&self) -> ProviderProfile {
        let standard = RetryPolicy::standard();
        match self {
            ProviderKind::Ai21 => ProviderProfile {
                kind: *self,
                display_name: "AI21",
                default_model: "jamba-mini",
                default_endpoint: "https://api.ai21.com/studio/v1",
                credential_env: "AI21_API_KEY",
                shape: RequestShape::SystemAndUser,
                tier: EnforcementTier::None,
                trigger_token: None,
                extract_embedded_json: true,
                schema: SchemaSupport::NONE,
                retry: standard,
            },
            ProviderKind::Anthropic => ProviderProfile {
                kind: *self,
                display_name: "Anthropic",
                default_model: "claude-haiku-4-5",
                default_endpoint: "https://api.anthropic.com",
                credential_env: "ANTHROPIC_API_KEY",
                shape: RequestShape::ToolCall,
                tier: EnforcementTier::Strict,
                trigger_token: None,
                extract_embedded_json: false,
                schema: SchemaSupport {
                    attach: true,
                    max_length: true,
                    bounds: true,
                    strict: false,
                    dialect: SchemaDialect::JsonSchema,
                },
                retry: standard,
            },
            ProviderKind::Cohere => ProviderProfile {
                kind: *self,
                display_name: "Cohere",
                default_model: "command-r-plus-08-2024",
                default_endpoint: "https://api.cohere.com",
                credential_env: "CO_API_KEY",
                shape: RequestShape::SingleUserMessage,
                tier: EnforcementTier::Enforced,
                trigger_token: None,
                // Cohere rejects `maxLength` in response schemas.
                extract_embedded_json: true,
                schema: SchemaSupport {
                    attach: true,
                    max_length: false,
                    bounds: true,
                    strict: false,
                    dialect: SchemaDialect::JsonSchema,
                },
                retry: standard.with_rate_limit_delay(Duration::from_secs(10)),
            },
            ProviderKind::DeepSeek => ProviderProfile {
                kind: *self,
                display_name: "DeepSeek",
                default_model: "deepseek-chat",
                default_endpoint: "https://api.deepseek.com",
                credential_env: "DEEPSEEK_API_KEY",
                shape: RequestShape::SingleUserMessage,
                tier: EnforcementTier::JsonOnly,
                // JSON mode fails silently unless the prompt mentions "json".
                trigger_token: Some("json"),
                extract_embedded_json: true,
                schema: SchemaSupport::NONE,
                retry: standard.with_max_attempts(5),
            },
            ProviderKind::Google => ProviderProfile {
                kind: *self,
                display_name: "Google",
                default_model: "gemini-2.5-flash",
                default_endpoint: "https://generativelanguage.googleapis.com",
                credential_env: "GEMINI_API_KEY",
                shape: RequestShape::ContentString,
                tier: EnforcementTier::Enforced,
                trigger_token: None,
                extract_embedded_json: false,
                schema: SchemaSupport {
                    attach: true,
                    max_length: true,
                    bounds: true,
                    strict: false,
                    dialect: SchemaDialect::OpenApi,
                },
                retry: standard,
            },
            ProviderKind::Groq => ProviderProfile {
                kind: *self,
                display_name: "Groq",
                default_model: "meta-llama/llama-4-scout-17b-16e-instruct",
                default_endpoint: "https://api.groq.com/openai/v1",
                credential_env: "GROQ_API_KEY",
                shape: RequestShape::SystemAndUser,
                tier: EnforcementTier::JsonOnly,
                trigger_token: Some("json"),
                extract_embedded_json: true,
                schema: SchemaSupport::NONE,
                retry: standard.with_rate_limit_delay(Duration::from_secs(10)),
            },
            ProviderKind::Mistral => ProviderProfile {
                kind: *self,
                display_name: "Mistral",
                default_model: "mistral-large-latest",
                default_endpoint: "https://api.mistral.ai/v1",
                credential_env: "MISTRAL_API_KEY",
                shape: RequestShape::SystemAndUser,
                tier: EnforcementTier::JsonOnly,
                trigger_token: None,
                extract_embedded_json: true,
                schema: SchemaSupport::NONE,
                retry: standard,
            },
            ProviderKind::OpenAi => ProviderProfile {
                kind: *self,
                display_name: "OpenAI",
                default_model: "gpt-4o",
                default_endpoint: "https://api.openai.com/v1",
                credential_env: "OPENAI_API_KEY",
                shape: RequestShape::SystemAndUser,
                tier: EnforcementTier::Enforced,
                trigger_token: None,
                // Strict structured outputs: every property required, nullable
                // types for optional values, no length or range keywords.
                extract_embedded_json: false,
                schema: SchemaSupport {
                    attach: true,
                    max_length: false,
                    bounds: false,
                    strict: true,
                    dialect: SchemaDialect::JsonSchema,
                },
                retry: standard,
            },
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| format!("unknown provider '{s}'"))
    }
}

/// How strongly a provider guarantees the shape of its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementTier {
    /// Free text that merely tends to contain JSON.
    None,
    /// Syntactically valid JSON, any structure.
    JsonOnly,
    /// JSON conforming to the attached schema.
    Enforced,
    /// Already-typed structured data (tool call arguments).
    Strict,
}

impl EnforcementTier {
    /// Lenient tiers fill absent non-key fields with zero values.
    pub fn is_lenient(&self) -> bool {
        matches!(self, EnforcementTier::None | EnforcementTier::JsonOnly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// Separate system and user messages (chat completions).
    SystemAndUser,
    /// One user message carrying the system instructions.
    SingleUserMessage,
    /// Raw content string with generation config (Gemini).
    ContentString,
    /// Forced tool call whose arguments are the record.
    ToolCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDialect {
    /// Standard JSON Schema: lowercase type names, `["number", "null"]`.
    JsonSchema,
    /// OpenAPI subset: uppercase type names, `nullable: true`.
    OpenApi,
}

/// Which schema keywords a provider accepts on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaSupport {
    pub attach: bool,
    pub max_length: bool,
    pub bounds: bool,
    pub strict: bool,
    pub dialect: SchemaDialect,
}

impl SchemaSupport {
    pub const NONE: SchemaSupport = SchemaSupport {
        attach: false,
        max_length: false,
        bounds: false,
        strict: false,
        dialect: SchemaDialect::JsonSchema,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderProfile {
    pub kind: ProviderKind,
    pub display_name: &'static str,
    pub default_model: &'static str,
    pub default_endpoint: &'static str,
    pub credential_env: &'static str,
    pub shape: RequestShape,
    pub tier: EnforcementTier,
    pub trigger_token: Option<&'static str>,
    /// Replies that fail to decode get a second try on the outermost
    /// `{...}`/`[...]` slice, for models that wrap JSON in prose.
    pub extract_embedded_json: bool,
    pub schema: SchemaSupport,
    pub retry: RetryPolicy,
}

/// Retry budget and backoff for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first call.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Fixed wait after a rate-limit signal, replacing the backoff.
    pub rate_limit_delay: Option<Duration>,
}

impl RetryPolicy {
    pub const fn standard() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            rate_limit_delay: None,
        }
    }

    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub const fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = Some(delay);
        self
    }

    /// Exponential backoff after the given failed attempt (1-based):
    /// `base * 2^(attempt-1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(2_u32.pow(exponent))
    }

    /// Wait before the next attempt, given the error that ended `attempt`.
    pub fn delay_before_retry(&self, attempt: u32, error: &ProviderError) -> Duration {
        match error {
            ProviderError::RateLimited { retry_after } => self
                .rate_limit_delay
                .or(*retry_after)
                .unwrap_or_else(|| self.backoff(attempt)),
            _ => self.backoff(attempt),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// What a provider returned, tagged with how much its shape can be trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub provider: ProviderKind,
    pub tier: EnforcementTier,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Typed(serde_json::Value),
}

impl RawResponse {
    pub fn text(provider: ProviderKind, tier: EnforcementTier, text: impl Into<String>) -> Self {
        Self {
            provider,
            tier,
            payload: Payload::Text(text.into()),
        }
    }

    pub fn typed(provider: ProviderKind, value: serde_json::Value) -> Self {
        Self {
            provider,
            tier: EnforcementTier::Strict,
            payload: Payload::Typed(value),
        }
    }

    /// Blank text, a bare `{}` or `null`, or an empty typed object.
    pub fn is_empty(&self) -> bool {
        match &self.payload {
            Payload::Text(text) => {
                let trimmed = text.trim();
                trimmed.is_empty() || trimmed == "{}" || trimmed == "null"
            }
            Payload::Typed(value) => match value {
                serde_json::Value::Null => true,
                serde_json::Value::Object(map) => map.is_empty(),
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("provider server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    #[error("rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("malformed provider envelope: {0}")]
    MalformedResponse(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("request rejected (HTTP {status}): {body}")]
    InvalidRequest { status: u16, body: String },

    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Classify a non-success HTTP status.
    pub fn from_status(
        status: u16,
        body: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        let body = body.into();
        match status {
            401 | 403 => ProviderError::Authentication(body),
            429 => ProviderError::RateLimited { retry_after },
            408 => ProviderError::Timeout(body),
            500..=599 => ProviderError::Server { status, body },
            _ => ProviderError::InvalidRequest { status, body },
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_)
            | ProviderError::Timeout(_)
            | ProviderError::Server { .. }
            | ProviderError::RateLimited { .. }
            | ProviderError::EmptyResponse
            | ProviderError::MalformedResponse(_) => true,
            ProviderError::Authentication(_)
            | ProviderError::InvalidRequest { .. }
            | ProviderError::Exhausted { .. } => false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::RateLimited { .. } => ErrorKind::RateLimit,
            ProviderError::Authentication(_) | ProviderError::InvalidRequest { .. } => {
                ErrorKind::ProviderRejected
            }
            ProviderError::Exhausted { last, .. } => last.kind(),
            _ => ErrorKind::TransientProvider,
        }
    }
}

/// One provider integration.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Provider and model as configured. Never touches the network.
    fn fetch_identity(&self) -> ModelIdentity;

    fn retry_policy(&self) -> RetryPolicy {
        self.kind().profile().retry
    }

    /// One request for `kind` about `subject` (entity name, or the country name for cities).
    async fn fetch_entity(
        &self,
        kind: EntityKind,
        subject: &str,
    ) -> Result<RawResponse, ProviderError>;
}
