//! Unbounded retry
//!
//! Retries an operation for as long as it fails with a conflict. There is
//! no attempt cap: the loop only ends on success or on a non-conflict error.
//! Keep this out of ordinary command paths, which stay single-attempt.

use std::time::Duration;

/// Delay between conflicting attempts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Zero means busy retry (only yields the thread)
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn busy() -> Self {
        Self::default()
    }

    pub fn with_backoff(backoff: Duration) -> Self {
        Self { backoff }
    }
}

/// Run `operation` until it succeeds or fails with an error that
/// `is_conflict` rejects. `operation` gets the 1-based attempt number.
pub fn retry_on_conflict<T, E, F, P>(
    policy: RetryPolicy,
    mut operation: F,
    is_conflict: P,
) -> Result<T, E>
where
    F: FnMut(u64) -> Result<T, E>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;

        match operation(attempt) {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempt = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) if is_conflict(&error) => {
                tracing::warn!(
                    attempt = attempt,
                    error = %error,
                    delay_ms = policy.backoff.as_millis() as u64,
                    "Conflict, retrying"
                );
                if policy.backoff.is_zero() {
                    std::thread::yield_now();
                } else {
                    std::thread::sleep(policy.backoff);
                }
            }
            Err(error) => {
                tracing::error!(attempt = attempt, error = %error, "Operation failed permanently");
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Conflict,
        Fatal,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    #[test]
    fn test_retries_until_success() {
        let mut calls = 0;

        let result = retry_on_conflict(
            RetryPolicy::busy(),
            |attempt| {
                calls += 1;
                if attempt < 100 {
                    Err(TestError::Conflict)
                } else {
                    Ok(attempt)
                }
            },
            |e| *e == TestError::Conflict,
        );

        assert_eq!(result, Ok(100));
        assert_eq!(calls, 100);
    }

    #[test]
    fn test_stops_on_non_conflict_error() {
        let mut calls = 0;

        let result: Result<(), TestError> = retry_on_conflict(
            RetryPolicy::with_backoff(Duration::from_millis(1)),
            |attempt| {
                calls += 1;
                if attempt == 1 {
                    Err(TestError::Conflict)
                } else {
                    Err(TestError::Fatal)
                }
            },
            |e| *e == TestError::Conflict,
        );

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls, 2);
    }
}
