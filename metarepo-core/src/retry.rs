//! Bounded immediate retry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How many times an action may run before its failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never below 1.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Run once, never retry.
    pub fn once() -> Self {
        Self::new(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5)
    }
}

/// The retry budget ran out; `source` is the last failure, unchanged.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempt(s): {source}")]
pub struct RetryError<E>
where
    E: std::error::Error + 'static,
{
    pub attempts: u32,
    #[source]
    pub source: E,
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    pub fn into_inner(self) -> E {
        self.source
    }
}

/// Run `action` until it succeeds or `policy.max_attempts` is reached.
///
/// `action` receives the 1-based attempt number. There is no delay between
/// attempts.
pub fn with_retry<T, E, F>(policy: RetryPolicy, mut action: F) -> Result<T, RetryError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut(u32) -> Result<T, E>,
{
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match action(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max => {
                tracing::warn!("attempt {attempt}/{max} failed: {e}; retrying");
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!("attempt {attempt}/{max} failed: {e}; giving up");
                return Err(RetryError {
                    attempts: attempt,
                    source: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq, Eq)]
    #[error("flaky #{0}")]
    struct Flaky(u32);

    #[test]
    fn succeeds_after_transient_failures() {
        let mut calls = 0;
        let result = with_retry(RetryPolicy::new(5), |attempt| {
            calls += 1;
            if attempt < 3 {
                Err(Flaky(attempt))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn exhaustion_surfaces_last_error() {
        let mut calls = 0;
        let err = with_retry(RetryPolicy::new(4), |attempt| -> Result<(), Flaky> {
            calls += 1;
            Err(Flaky(attempt))
        })
        .unwrap_err();
        assert_eq!(calls, 4);
        assert_eq!(err.attempts, 4);
        assert_eq!(err.into_inner(), Flaky(4));
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let mut calls = 0;
        let _ = with_retry(RetryPolicy::new(0), |_| -> Result<(), Flaky> {
            calls += 1;
            Err(Flaky(0))
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn default_policy_is_five_attempts() {
        assert_eq!(RetryPolicy::default().max_attempts, 5);
    }
}
