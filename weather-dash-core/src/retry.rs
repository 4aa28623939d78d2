//! Retry policy for the forecast query.
//!
//! Failures are retried until the attempt cap is reached, except
//! `Unauthorized`, which is returned immediately.

use std::{future::Future, time::Duration};

use crate::error::DashboardError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between attempts. Zero by default.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, delay: Duration::ZERO }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Whether another attempt should follow failed attempt number `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32, error: &DashboardError) -> bool {
        if error.is_unauthorized() {
            return false;
        }
        attempt < self.max_attempts
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, DashboardError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DashboardError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if self.should_retry(attempt, &err) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "retrying request"
                    );
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn server_error() -> DashboardError {
        DashboardError::NetworkOrServer("503 Service Unavailable".into())
    }

    #[test]
    fn unauthorized_is_never_retried() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(1, &DashboardError::Unauthorized));
    }

    #[test]
    fn other_failures_retry_until_third_attempt() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1, &server_error()));
        assert!(policy.should_retry(2, &server_error()));
        assert!(!policy.should_retry(3, &server_error()));
    }

    #[tokio::test]
    async fn run_makes_three_attempts_then_fails() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::default()
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(server_error())
            })
            .await;

        assert_eq!(result, Err(server_error()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_stops_on_unauthorized() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::default()
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DashboardError::Unauthorized)
            })
            .await;

        assert_eq!(result, Err(DashboardError::Unauthorized));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_recovers_on_second_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = RetryPolicy::default()
            .run(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(server_error())
                } else {
                    Ok("sunny")
                }
            })
            .await;

        assert_eq!(result, Ok("sunny"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
