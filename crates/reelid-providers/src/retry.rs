//! Retry with exponential backoff for provider calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ProviderResult;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Operation name for logging.
    pub operation_name: &'static str,
}

impl RetryConfig {
    pub fn new(operation_name: &'static str, max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            operation_name,
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

/// Run `operation`, retrying only errors that report themselves retryable.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> ProviderResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay = config.delay_for_attempt(attempt);
                attempt += 1;
                warn!(
                    "{} failed (attempt {}), retrying in {:?}: {}",
                    config.operation_name, attempt, delay, e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> ProviderError {
        ProviderError::ServiceUnavailable {
            provider: "test".to_string(),
            message: "down".to_string(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RetryConfig::new("op", 5);
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_retryable_errors() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new("op", 2);

        let result = with_retry(&config, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(unavailable())
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new("op", 3);

        let result: ProviderResult<()> = with_retry(&config, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::NotFound("film".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
