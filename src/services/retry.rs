//! Retry policy with exponential backoff and pluggable stuck detection.
//!
//! Backoff doubles with each failed attempt: `base * 2^attempt`, capped at
//! `max_backoff`. A [`StuckPolicy`] sees the full attempt history and can
//! abandon a task earlier than the attempt cap.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::RetryConfig;
use crate::domain::ports::{AttemptHistory, StuckPolicy, ThreeStrikes};

/// Outcome of a retried operation, with the attempt bookkeeping the
/// scheduler records into `ExecutionResult`s.
#[derive(Debug)]
pub struct Attempted<T> {
    /// Final result: the first success, or the last error once exhausted.
    pub outcome: DomainResult<T>,
    /// Attempts made, first try included.
    pub attempts: u32,
    /// Failure history accumulated across attempts.
    pub history: AttemptHistory,
}

/// Retry policy with exponential backoff.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_backoff: Duration,
    stuck: Arc<dyn StuckPolicy>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_backoff", &self.max_backoff)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Create a policy from configuration, with the default three-strikes
    /// stuck detection.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            stuck: Arc::new(ThreeStrikes::with_limit(config.max_attempts.max(1))),
        }
    }

    /// Replace the stuck-detection policy.
    #[must_use]
    pub fn with_stuck_policy(mut self, stuck: Arc<dyn StuckPolicy>) -> Self {
        self.stuck = stuck;
        self
    }

    /// Backoff before retry number `attempt` (zero-based failure count).
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.min(32));
        let delay = self
            .base_delay
            .saturating_mul(u32::try_from(factor).unwrap_or(u32::MAX));
        delay.min(self.max_backoff)
    }

    /// Execute an async operation, retrying transparently until it succeeds,
    /// the attempt cap is hit, or the stuck policy aborts.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        let mut history = AttemptHistory::default();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation succeeded after retries");
                    }
                    return Attempted {
                        outcome: Ok(value),
                        attempts: attempt,
                        history,
                    };
                }
                Err(err) => {
                    history.record(attempt, err.to_string());

                    let exhausted = attempt >= self.max_attempts;
                    let stuck = self.stuck.should_abort(&history);
                    if exhausted || stuck {
                        warn!(
                            attempt,
                            exhausted, stuck, error = %err,
                            "operation abandoned"
                        );
                        return Attempted {
                            outcome: Err(err),
                            attempts: attempt,
                            history,
                        };
                    }

                    let backoff = self.calculate_backoff(attempt - 1);
                    warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::from_config(&RetryConfig {
            max_attempts,
            base_delay_ms: 1,
            max_backoff_ms: 4,
        })
    }

    #[tokio::test]
    async fn first_success_makes_one_attempt() {
        let policy = fast_policy(3);
        let result = policy.execute(|| async { Ok::<_, DomainError>(42) }).await;

        assert_eq!(result.attempts, 1);
        assert_eq!(result.outcome.unwrap(), 42);
        assert!(result.history.attempts.is_empty());
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let policy = fast_policy(5);
        let calls = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(DomainError::ExecutionFailed("transient".into()))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.attempts, 3);
        assert_eq!(result.outcome.unwrap(), "done");
        assert_eq!(result.history.strikes(), 2);
    }

    #[tokio::test]
    async fn last_error_is_returned_when_exhausted() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    Err::<(), _>(DomainError::ExecutionFailed(format!("failure {n}")))
                }
            })
            .await;

        assert_eq!(result.attempts, 3);
        let err = result.outcome.unwrap_err();
        assert!(err.to_string().contains("failure 3"));
        assert_eq!(result.history.strikes(), 3);
    }

    #[tokio::test]
    async fn custom_stuck_policy_can_abort_early() {
        struct OneStrike;
        impl StuckPolicy for OneStrike {
            fn should_abort(&self, history: &AttemptHistory) -> bool {
                history.strikes() >= 1
            }
        }

        let policy = fast_policy(10).with_stuck_policy(Arc::new(OneStrike));
        let result = policy
            .execute(|| async { Err::<(), _>(DomainError::ExecutionFailed("boom".into())) })
            .await;

        assert_eq!(result.attempts, 1);
        assert!(result.outcome.is_err());
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::from_config(&RetryConfig {
            max_attempts: 5,
            base_delay_ms: 100,
            max_backoff_ms: 350,
        });

        assert_eq!(policy.calculate_backoff(0), Duration::from_millis(100));
        assert_eq!(policy.calculate_backoff(1), Duration::from_millis(200));
        assert_eq!(policy.calculate_backoff(2), Duration::from_millis(350));
        assert_eq!(policy.calculate_backoff(30), Duration::from_millis(350));
    }
}
