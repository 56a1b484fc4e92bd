//! Bounded retry with exponential backoff around another provider.
//!
//! Only transient failures (rate limit, timeout, network) are retried.
//! A 402 or any other API error is returned on the first attempt. A
//! `Retry-After` hint from the upstream replaces the computed delay, capped
//! at the configured maximum. With an attempt timeout set, each attempt gets
//! its own deadline and a hung attempt becomes a retryable timeout.

use async_trait::async_trait;
use docchat_core::error::ProviderError;
use docchat_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Retry policy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Deadline for one attempt of the wrapped provider.
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Delay before retry number `retry` (0-based).
    fn backoff(&self, retry: u32, error: &ProviderError) -> Duration {
        let hinted = match error {
            ProviderError::RateLimited {
                retry_after_secs: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        };
        let exponential = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(retry));
        hinted.unwrap_or(exponential).min(self.max_backoff)
    }
}

impl From<&docchat_config::RetryConfig> for RetryPolicy {
    fn from(config: &docchat_config::RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            attempt_timeout: None,
        }
    }
}

/// A provider that retries transient failures of the wrapped provider.
pub struct RetryProvider {
    name: String,
    inner: Arc<dyn docchat_core::Provider>,
    policy: RetryPolicy,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn docchat_core::Provider>, policy: RetryPolicy) -> Self {
        Self {
            name: format!("{}+retry", inner.name()),
            inner,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    async fn attempt(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let Some(limit) = self.policy.attempt_timeout else {
            return self.inner.complete(request).await;
        };
        tokio::time::timeout(limit, self.inner.complete(request))
            .await
            .unwrap_or_else(|_| {
                Err(ProviderError::Timeout(format!(
                    "attempt exceeded {}s",
                    limit.as_secs()
                )))
            })
    }
}

#[async_trait]
impl docchat_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let mut retry = 0;
        loop {
            match self.attempt(request.clone()).await {
                Ok(response) => {
                    if retry > 0 {
                        info!(provider = %self.inner.name(), retries = retry, "Retry succeeded");
                    }
                    return Ok(response);
                }
                Err(e) if e.is_transient() && retry < self.policy.max_retries => {
                    let delay = self.policy.backoff(retry, &e);
                    warn!(
                        provider = %self.inner.name(),
                        error = %e,
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Transient provider failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
