//! Retry policy for resource calls.
//!
//! Nothing is retried unless the configured policy allows more than one
//! attempt. Only transport failures and upstream 5xx responses are retried;
//! every 4xx class is terminal on the first response.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::errors::ClientResult;

/// Delay schedule between attempts
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffStrategy {
    #[default]
    None,
    Constant {
        delay_ms: u64,
    },
    Linear {
        initial_ms: u64,
        increment_ms: u64,
        max_ms: u64,
    },
    Exponential {
        initial_ms: u64,
        multiplier: f64,
        max_ms: u64,
    },
}

impl BackoffStrategy {
    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let millis = match self {
            Self::None => 0,
            Self::Constant { delay_ms } => *delay_ms,
            Self::Linear {
                initial_ms,
                increment_ms,
                max_ms,
            } => initial_ms
                .saturating_add(u64::from(attempt).saturating_mul(*increment_ms))
                .min(*max_ms),
            Self::Exponential {
                initial_ms,
                multiplier,
                max_ms,
            } => {
                let delay = (*initial_ms as f64) * multiplier.powi(attempt as i32);
                (delay as u64).min(*max_ms)
            }
        };
        Duration::from_millis(millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one (1 = no retry)
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: BackoffStrategy::None,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run `operation` until it succeeds, fails terminally, or attempts run out
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.backoff.delay_for_attempt(attempt - 1);
                    warn!(
                        "{} failed (attempt {}/{}): {} - retrying in {}ms",
                        label,
                        attempt,
                        max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::client::errors::{ApiOperation, ClientError};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_delays() {
        let linear = BackoffStrategy::Linear {
            initial_ms: 100,
            increment_ms: 50,
            max_ms: 180,
        };
        assert_eq!(linear.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(linear.delay_for_attempt(1), Duration::from_millis(150));
        assert_eq!(linear.delay_for_attempt(5), Duration::from_millis(180));

        let exponential = BackoffStrategy::Exponential {
            initial_ms: 100,
            multiplier: 2.0,
            max_ms: 1000,
        };
        assert_eq!(exponential.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(exponential.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(exponential.delay_for_attempt(10), Duration::from_millis(1000));

        assert_eq!(BackoffStrategy::None.delay_for_attempt(3), Duration::ZERO);
    }

    #[test]
    fn test_linear_backoff_saturates_on_large_values() {
        let linear = BackoffStrategy::Linear {
            initial_ms: u64::MAX - 10,
            increment_ms: u64::MAX / 2,
            max_ms: u64::MAX,
        };
        assert_eq!(linear.delay_for_attempt(0), Duration::from_millis(u64::MAX - 10));
        assert_eq!(linear.delay_for_attempt(u32::MAX), Duration::from_millis(u64::MAX));
    }

    #[tokio::test]
    async fn test_default_policy_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: ClientResult<()> = RetryPolicy::default()
            .run("test", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::from_status(ApiOperation::GetTenant, 503, String::new()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::default().with_max_attempts(3);
        let result = policy
            .run("test", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(ClientError::from_status(ApiOperation::GetTenant, 502, String::new()))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::default().with_max_attempts(5);
        let result: ClientResult<()> = policy
            .run("test", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::from_status(ApiOperation::GetTenant, 404, String::new()))
            })
            .await;

        assert_eq!(result.unwrap_err().status(), Some(404));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
