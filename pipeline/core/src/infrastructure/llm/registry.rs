// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Provider Adapter Factory
//
// Maps a provider kind to the adapter implementing its wire dialect.

use std::sync::Arc;

use crate::domain::config::{ConfigError, IngestConfig, ProviderSettings};
use crate::domain::provider::{ProviderAdapter, ProviderKind};

use super::anthropic::AnthropicAdapter;
use super::cohere::CohereAdapter;
use super::google::GoogleAdapter;
use super::openai_compatible::OpenAiCompatibleAdapter;

pub fn create_adapter(settings: ProviderSettings) -> Result<Arc<dyn ProviderAdapter>, ConfigError> {
    let adapter: Arc<dyn ProviderAdapter> = match settings.kind {
        ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(settings)?),
        ProviderKind::Cohere => Arc::new(CohereAdapter::new(settings)?),
        ProviderKind::Google => Arc::new(GoogleAdapter::new(settings)?),
        ProviderKind::Ai21
        | ProviderKind::DeepSeek
        | ProviderKind::Groq
        | ProviderKind::Mistral
        | ProviderKind::OpenAi => Arc::new(OpenAiCompatibleAdapter::new(settings)?),
    };
    Ok(adapter)
}

/// Resolve settings for `kind` from configuration and build its adapter.
pub fn adapter_from_config(
    config: &IngestConfig,
    kind: ProviderKind,
) -> Result<Arc<dyn ProviderAdapter>, ConfigError> {
    let settings = config.provider_settings(kind)?;
    tracing::debug!(
        provider = %kind,
        model = %settings.model,
        endpoint = %settings.endpoint,
        "creating provider adapter"
    );
    create_adapter(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::RetryPolicy;

    #[test]
    fn every_provider_has_an_adapter() {
        for kind in ProviderKind::ALL {
            let adapter = create_adapter(ProviderSettings::with_defaults(kind, "key")).unwrap();
            assert_eq!(adapter.kind(), kind);
            let identity = adapter.fetch_identity();
            assert_eq!(identity.provider, kind.profile().display_name);
            assert_eq!(identity.model_name, kind.profile().default_model);
        }
    }

    #[test]
    fn configured_retry_budget_reaches_the_adapter() {
        let mut settings = ProviderSettings::with_defaults(ProviderKind::Mistral, "key");
        settings.retry = RetryPolicy::standard().with_max_attempts(7);
        assert_eq!(create_adapter(settings).unwrap().retry_policy().max_attempts, 7);
    }
}
