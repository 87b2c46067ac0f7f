//! Retry decorator with a per-attempt timeout.
//!
//! Wraps any provider. Each attempt is bounded by `timeout`; a failed or
//! timed-out attempt is retried up to `max_retries` times, sleeping
//! `backoff`, then twice that, and so on between attempts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clinidraft_core::{Provider, ProviderError, ProviderRequest, ProviderResponse};
use tracing::{info, warn};

/// A provider that retries the wrapped provider on failure.
pub struct RetryingProvider {
    inner: Arc<dyn Provider>,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl RetryingProvider {
    /// Wrap a provider with one retry and a 500ms backoff.
    pub fn new(inner: Arc<dyn Provider>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            max_retries: 1,
            backoff: Duration::from_millis(500),
        }
    }

    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    /// Total attempts made before giving up.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Configuration problems will not fix themselves on a second attempt.
fn is_retryable(error: &ProviderError) -> bool {
    !matches!(
        error,
        ProviderError::NotConfigured(_) | ProviderError::AuthenticationFailed(_)
    )
}

#[async_trait]
impl Provider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let provider_name = self.inner.name().to_string();
        let mut delay = self.backoff;
        let mut attempt = 1;

        loop {
            let error =
                match tokio::time::timeout(self.timeout, self.inner.complete(request.clone()))
                    .await
                {
                    Ok(Ok(response)) => {
                        if attempt > 1 {
                            info!(provider = %provider_name, attempt, "Retry: provider recovered");
                        }
                        return Ok(response);
                    }
                    Ok(Err(e)) => {
                        warn!(
                            provider = %provider_name,
                            attempt,
                            error = %e,
                            "Retry: provider failed"
                        );
                        e
                    }
                    Err(_) => {
                        warn!(
                            provider = %provider_name,
                            attempt,
                            timeout_ms = self.timeout.as_millis() as u64,
                            "Retry: provider timed out"
                        );
                        ProviderError::Timeout(format!(
                            "Provider '{}' timed out after {}ms",
                            provider_name,
                            self.timeout.as_millis()
                        ))
                    }
                };

            if attempt >= self.max_attempts() || !is_retryable(&error) {
                return Err(error);
            }

            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
            attempt += 1;
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        match tokio::time::timeout(self.timeout, self.inner.health_check()).await {
            Ok(result) => result,
            Err(_) => Ok(false),
        }
    }
}
