//! Retry logic with exponential backoff

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use pulse_core::Result;

/// Retry policy configuration
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after every failure
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Execute a future with retry logic
///
/// # Errors
///
/// Returns the last error from `f` once `max_attempts` is reached or the
/// error is not retryable.
pub async fn with_backoff<F, Fut, T>(policy: &RetryPolicy, name: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match f().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !e.is_retryable() {
                    return Err(e);
                }

                if attempt >= policy.max_attempts {
                    warn!(operation = name, attempts = attempt, error = %e, "max retries reached");
                    return Err(e);
                }

                let delay = policy.delay_after(attempt);
                debug!(
                    operation = name,
                    attempt,
                    delay_ms = delay.as_millis(),
                    error = %e,
                    "retrying after backoff"
                );
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{ProviderKind, PulseError};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[test]
    fn delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn three_failures_wait_one_then_two_seconds() {
        let attempts: Arc<Mutex<Vec<Instant>>> = Arc::default();
        let seen = attempts.clone();

        let result: Result<()> = with_backoff(&RetryPolicy::default(), "test", || {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push(Instant::now());
                Err(PulseError::Transport("connection reset".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(PulseError::Transport(_))));
        let times = attempts.lock().unwrap();
        assert_eq!(times.len(), 3);
        assert_eq!(times[1] - times[0], Duration::from_millis(1000));
        assert_eq!(times[2] - times[1], Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failure() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = calls.clone();

        let result = with_backoff(&RetryPolicy::default(), "test", || {
            let counter = counter.clone();
            async move {
                let mut n = counter.lock().unwrap();
                *n += 1;
                if *n == 1 {
                    Err(PulseError::EmptyResponse)
                } else {
                    Ok(*n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_errors_stop_immediately() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = calls.clone();

        let result: Result<()> = with_backoff(&RetryPolicy::default(), "test", || {
            let counter = counter.clone();
            async move {
                *counter.lock().unwrap() += 1;
                Err(PulseError::MissingCredential(ProviderKind::Gemini))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
