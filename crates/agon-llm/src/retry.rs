//! Retrying LLM provider wrapper
//!
//! Transient failures (connection errors, rate limiting, unavailability)
//! are retried with exponential backoff so that callers see one logical
//! call. Non-retryable errors pass straight through.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse, TextStream};

/// Configuration for transparent retries
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryConfig {
    /// Immediate retries, for tests
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Provider wrapper that retries transient failures
#[derive(Debug)]
pub struct RetryingProvider<P: LlmProvider + ?Sized> {
    inner: Arc<P>,
    config: RetryConfig,
    total_requests: AtomicU64,
    total_retries: AtomicU64,
}

impl<P: LlmProvider> RetryingProvider<P> {
    pub fn new(provider: P, config: RetryConfig) -> Self {
        Self::from_arc(Arc::new(provider), config)
    }
}

impl<P: LlmProvider + ?Sized> RetryingProvider<P> {
    pub fn from_arc(inner: Arc<P>, config: RetryConfig) -> Self {
        Self {
            inner,
            config,
            total_requests: AtomicU64::new(0),
            total_retries: AtomicU64::new(0),
        }
    }

    /// `(requests, retries)` observed so far
    pub fn stats(&self) -> (u64, u64) {
        (
            self.total_requests.load(Ordering::Relaxed),
            self.total_retries.load(Ordering::Relaxed),
        )
    }

    async fn backoff(&self, attempt: u32, error: &LlmError) {
        self.total_retries.fetch_add(1, Ordering::Relaxed);
        let delay = self.config.delay(attempt);
        tracing::warn!(
            provider = %self.inner.name(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Transient LLM failure, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl<P: LlmProvider + ?Sized + 'static> LlmProvider for RetryingProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let mut attempt = 1;
        loop {
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    self.backoff(attempt, &e).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Only establishing the stream is retried; a failure after chunks
    /// have been delivered surfaces to the caller.
    async fn stream(&self, request: LlmRequest) -> Result<TextStream, LlmError> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let mut attempt = 1;
        loop {
            match self.inner.stream(request.clone()).await {
                Ok(stream) => return Ok(stream),
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    self.backoff(attempt, &e).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let mock = MockProvider::with_responder(|_, idx| {
            if idx < 2 {
                Err(LlmError::RateLimited)
            } else {
                Ok("finally".to_string())
            }
        });
        let llm = RetryingProvider::new(mock, RetryConfig::immediate(3));
        assert_eq!(llm.ask("hi").await.unwrap(), "finally");
        assert_eq!(llm.stats(), (1, 2));
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let mock = MockProvider::with_responder(|_, _| Err(LlmError::NotAvailable));
        let llm = RetryingProvider::new(mock, RetryConfig::immediate(2));
        assert_eq!(llm.ask("hi").await.unwrap_err(), LlmError::NotAvailable);
        assert_eq!(llm.stats(), (1, 1));
    }

    #[tokio::test]
    async fn test_permanent_failures_pass_through() {
        let mock = MockProvider::constant("x").fail_on_calls(&[0]);
        let llm = RetryingProvider::new(mock, RetryConfig::immediate(5));
        assert!(matches!(
            llm.ask("hi").await,
            Err(LlmError::RequestFailed(_))
        ));
        assert_eq!(llm.stats(), (1, 0));
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(config.delay(1), Duration::from_millis(100));
        assert_eq!(config.delay(2), Duration::from_millis(200));
        assert_eq!(config.delay(3), Duration::from_millis(350));
    }
}
