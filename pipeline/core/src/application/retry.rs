// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Retry Coordinator
//!
//! Wraps a provider call in the provider's [`RetryPolicy`]: exponential
//! backoff for transient failures, a fixed wait after rate-limit signals where
//! the provider has one, and no retry at all for rejected requests. After
//! `max_attempts` failures the last error is returned inside
//! [`ProviderError::Exhausted`].

use std::future::Future;
use tracing::{debug, warn};

use crate::domain::provider::{
    ProviderAdapter, ProviderError, ProviderKind, RawResponse, RetryPolicy,
};
use crate::domain::records::EntityKind;

#[derive(Debug, Clone, Copy)]
pub struct RetryCoordinator {
    provider: ProviderKind,
    policy: RetryPolicy,
}

impl RetryCoordinator {
    pub fn new(provider: ProviderKind, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn for_adapter(adapter: &dyn ProviderAdapter) -> Self {
        Self::new(adapter.kind(), adapter.retry_policy())
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// One entity fetch under the retry policy. A blank payload counts as a
    /// transient failure.
    pub async fn fetch(
        &self,
        adapter: &dyn ProviderAdapter,
        kind: EntityKind,
        subject: &str,
    ) -> Result<RawResponse, ProviderError> {
        self.run(move || async move {
            let response = adapter.fetch_entity(kind, subject).await?;
            if response.is_empty() {
                return Err(ProviderError::EmptyResponse);
            }
            Ok(response)
        })
        .await
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(
                            provider = %self.provider,
                            attempt,
                            "provider call succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(error) if !error.is_retryable() => {
                    warn!(
                        provider = %self.provider,
                        attempt,
                        error = %error,
                        "provider call failed permanently"
                    );
                    return Err(error);
                }
                Err(error) if attempt >= max_attempts => {
                    warn!(
                        provider = %self.provider,
                        attempts = attempt,
                        error = %error,
                        "provider retries exhausted"
                    );
                    return Err(ProviderError::Exhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
                Err(error) => {
                    let delay = self.policy.delay_before_retry(attempt, &error);
                    warn!(
                        provider = %self.provider,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "provider call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
