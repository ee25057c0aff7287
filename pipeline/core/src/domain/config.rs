// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Ingest Configuration
//!
//! YAML configuration for provider credentials, model overrides and the
//! database connection. Secrets may be given literally or as `env:VAR_NAME`.
//!
//! ```yaml
//! database_url: env:DATABASE_URL
//! providers:
//!   - kind: groq
//!     api_key: env:GROQ_API_KEY
//!     model: llama-3.3-70b-versatile
//!     timeout_secs: 60
//!     retry:
//!       max_attempts: 4
//!       rate_limit_delay_ms: 15000
//! ```
//!
//! A provider with no entry still works: its default model and endpoint are
//! used and its key is read from the provider's conventional variable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::provider::{ProviderKind, RetryPolicy};

pub const CONFIG_PATH_ENV: &str = "ATLAS_CONFIG_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "./atlas-config.yaml";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    /// Literal key or `env:VAR_NAME`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_delay_ms: Option<u64>,
}

impl RetryOverrides {
    pub fn apply(&self, mut policy: RetryPolicy) -> RetryPolicy {
        if let Some(max_attempts) = self.max_attempts {
            policy.max_attempts = max_attempts.max(1);
        }
        if let Some(ms) = self.base_delay_ms {
            policy.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.rate_limit_delay_ms {
            policy.rate_limit_delay = Some(Duration::from_millis(ms));
        }
        policy
    }
}

/// Fully resolved settings an adapter is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ProviderSettings {
    /// Profile defaults with an explicit key.
    pub fn with_defaults(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        let profile = kind.profile();
        Self {
            kind,
            api_key: api_key.into(),
            model: profile.default_model.to_string(),
            endpoint: profile.default_endpoint.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: profile.retry,
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Problems that must stop a run before any entity is processed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing credential for {provider}: set {variable}")]
    MissingCredential { provider: String, variable: String },

    #[error("no database URL configured (set DATABASE_URL or database_url, or use --dry-run)")]
    MissingDatabaseUrl,

    #[error("a persistence store is required unless running dry")]
    MissingStore,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl IngestConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. ATLAS_CONFIG_PATH environment variable
    /// 2. ./atlas-config.yaml (working directory)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from(DEFAULT_CONFIG_FILE);
        if cwd.exists() {
            return Some(cwd);
        }

        None
    }

    /// Load from an explicit path (which must exist), else discovery, else defaults.
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// `ATLAS_DATABASE_URL` wins over `DATABASE_URL`, both win over the file.
    pub fn apply_env_overrides(&mut self) {
        for var in ["DATABASE_URL", "ATLAS_DATABASE_URL"] {
            if let Ok(val) = std::env::var(var) {
                if !val.trim().is_empty() {
                    tracing::debug!("Environment override: {}", var);
                    self.database_url = Some(val);
                }
            }
        }
    }

    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.kind == kind)
    }

    /// Merge the provider's entry (if any) over its profile defaults and
    /// resolve its credential.
    pub fn provider_settings(&self, kind: ProviderKind) -> Result<ProviderSettings, ConfigError> {
        let profile = kind.profile();
        let entry = self.provider(kind);

        let key_source = entry
            .and_then(|p| p.api_key.clone())
            .unwrap_or_else(|| format!("env:{}", profile.credential_env));
        let api_key = resolve_secret(&key_source).ok_or_else(|| ConfigError::MissingCredential {
            provider: profile.display_name.to_string(),
            variable: key_source
                .strip_prefix("env:")
                .unwrap_or("api_key")
                .to_string(),
        })?;

        let mut settings = ProviderSettings::with_defaults(kind, api_key);
        if let Some(entry) = entry {
            if let Some(model) = &entry.model {
                settings = settings.model(model.clone());
            }
            if let Some(endpoint) = &entry.endpoint {
                settings = settings.endpoint(endpoint.clone());
            }
            if let Some(secs) = entry.timeout_secs {
                if secs == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "timeout_secs for {} must be positive",
                        kind
                    )));
                }
                settings.timeout = Duration::from_secs(secs);
            }
            if let Some(retry) = &entry.retry {
                settings.retry = retry.apply(settings.retry);
            }
        }
        Ok(settings)
    }

    pub fn require_database_url(&self) -> Result<String, ConfigError> {
        self.database_url
            .as_deref()
            .and_then(resolve_secret)
            .ok_or(ConfigError::MissingDatabaseUrl)
    }
}

/// Resolve `env:VAR_NAME` or a literal value. Empty results count as missing.
pub fn resolve_secret(value: &str) -> Option<String> {
    let resolved = match value.strip_prefix("env:") {
        Some(var_name) => std::env::var(var_name.trim()).ok()?,
        None => value.to_string(),
    };
    if resolved.trim().is_empty() {
        None
    } else {
        Some(resolved)
    }
}
