//! Retry and timeout policies composed around suggestion fetches.

use std::future::Future;
use std::time::Duration;

use crate::error::{EgographError, Result};

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; values below 1 are raised to 1.
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// The last error is surfaced as [`EgographError::SourceFetch`].
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut delay = self.initial_backoff;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        log::debug!("{} succeeded on attempt {}", what, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if attempt < self.max_attempts => {
                    log::warn!("{}: retry {}/{} after error: {}", what, attempt, self.max_attempts - 1, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    return Err(EgographError::SourceFetch(format!(
                        "{} failed after {} attempt(s): {}",
                        what, attempt, e
                    )));
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(200))
    }
}

/// Upper bound on the wall-clock time of one (possibly retried) call.
#[derive(Debug, Clone)]
pub struct TimeoutPolicy {
    limit: Duration,
}

impl TimeoutPolicy {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub async fn run<T, Fut>(&self, what: &str, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(EgographError::SourceFetch(format!(
                "{} timed out after {} ms",
                what,
                self.limit.as_millis()
            ))),
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result = policy
            .run("flaky", || async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(EgographError::SourceFetch(format!("attempt {}", n)))
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<()> = policy
            .run("broken", || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(EgographError::InvalidInput("nope".to_string()))
            })
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, EgographError::SourceFetch(_)));
        assert!(err.to_string().contains("3 attempt(s)"));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_single_attempt_minimum() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let _: Result<()> = policy
            .run("once", || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(EgographError::Cancelled)
            })
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_fires() {
        let policy = TimeoutPolicy::new(Duration::from_millis(20));
        let result: Result<()> = policy
            .run("sleepy", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, EgographError::SourceFetch(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_timeout_passes_through_result() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.limit(), Duration::from_secs(5));
        let value = policy.run("fast", async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
    }
}
