// =====================================================================================
// RETRY EXECUTOR - EXPONENTIAL BACKOFF WITH A TOTAL BUDGET
// =====================================================================================
//
// Every network-bound step goes through `retry`, so a single transient blip
// neither flips a service's health nor pages anyone. An attempt can mark its
// error as permanent to stop retrying immediately.
// =====================================================================================

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::{sleep, timeout, Instant};
use tracing::warn;

pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    /// Relative spread applied to each delay, 0.0 disables jitter.
    pub randomization_factor: f64,
    pub max_interval: Duration,
    /// Total time budget across all attempts and delays.
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            multiplier: 1.5,
            randomization_factor: 0.5,
            max_interval: DEFAULT_MAX_INTERVAL,
            max_elapsed: DEFAULT_MAX_ELAPSED,
        }
    }
}

impl RetryPolicy {
    pub fn with_budget(budget: Duration) -> Self {
        Self {
            max_elapsed: budget,
            ..Self::default()
        }
    }

    pub fn without_jitter(mut self) -> Self {
        self.randomization_factor = 0.0;
        self
    }

    fn next_interval(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier).min(self.max_interval)
    }

    fn delay_for(&self, interval: Duration) -> Duration {
        let interval = interval.min(self.max_interval);
        if self.randomization_factor <= 0.0 {
            return interval;
        }
        let spread = interval.as_secs_f64() * self.randomization_factor;
        let low = (interval.as_secs_f64() - spread).max(0.0);
        let high = interval.as_secs_f64() + spread;
        let jittered = rand::thread_rng().gen_range(low..=high);
        Duration::from_secs_f64(jittered).min(self.max_interval)
    }
}

/// Error returned by one attempt.
#[derive(Debug)]
pub enum AttemptError<E> {
    /// Worth trying again.
    Transient(E),
    /// Retrying cannot help; stop now.
    Permanent(E),
}

impl<E> AttemptError<E> {
    pub fn transient(error: impl Into<E>) -> Self {
        AttemptError::Transient(error.into())
    }

    pub fn permanent(error: impl Into<E>) -> Self {
        AttemptError::Permanent(error.into())
    }
}

#[derive(Error, Debug)]
pub enum RetryError<E>
where
    E: fmt::Display + fmt::Debug,
{
    #[error("{operation} failed permanently: {error}")]
    Permanent { operation: String, error: E },

    #[error("{operation} gave up after {attempts} attempt(s): {error}")]
    Exhausted {
        operation: String,
        attempts: u32,
        error: E,
    },

    #[error("{operation} timed out after {attempts} attempt(s) ({elapsed_ms}ms)")]
    TimedOut {
        operation: String,
        attempts: u32,
        elapsed_ms: u64,
    },
}

impl<E> RetryError<E>
where
    E: fmt::Display + fmt::Debug,
{
    pub fn is_permanent(&self) -> bool {
        matches!(self, RetryError::Permanent { .. })
    }

    /// The error of the last attempt, if the attempt finished at all.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::Permanent { error, .. } | RetryError::Exhausted { error, .. } => Some(error),
            RetryError::TimedOut { .. } => None,
        }
    }
}

/// Runs `op` until it succeeds, fails permanently, or the policy's budget is spent.
///
/// The budget also bounds each attempt: an attempt still running when the
/// budget runs out is dropped. The error of the previous attempt is reported
/// if there was one, `TimedOut` otherwise.
pub async fn retry<T, E, F, Fut>(
    operation: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError<E>>>,
    E: fmt::Display + fmt::Debug,
{
    let started = Instant::now();
    let mut interval = policy.initial_interval;
    let mut attempts: u32 = 0;
    let mut last_error: Option<E> = None;

    loop {
        attempts += 1;
        let attempt_started = Instant::now();
        let remaining = policy.max_elapsed.saturating_sub(started.elapsed());

        let outcome = match timeout(remaining, op()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                warn!(
                    operation,
                    attempt = attempts,
                    duration_ms = attempt_started.elapsed().as_millis() as u64,
                    "Attempt cut off by retry budget"
                );
                return Err(match last_error {
                    Some(error) => RetryError::Exhausted {
                        operation: operation.to_string(),
                        attempts,
                        error,
                    },
                    None => RetryError::TimedOut {
                        operation: operation.to_string(),
                        attempts,
                        elapsed_ms,
                    },
                });
            }
        };

        let error = match outcome {
            Ok(value) => return Ok(value),
            Err(AttemptError::Permanent(error)) => {
                warn!(
                    operation,
                    attempt = attempts,
                    duration_ms = attempt_started.elapsed().as_millis() as u64,
                    error = %error,
                    "Encountered permanent error, not retrying"
                );
                return Err(RetryError::Permanent {
                    operation: operation.to_string(),
                    error,
                });
            }
            Err(AttemptError::Transient(error)) => error,
        };

        warn!(
            operation,
            attempt = attempts,
            duration_ms = attempt_started.elapsed().as_millis() as u64,
            error = %error,
            "Encountered error during run"
        );

        let delay = policy.delay_for(interval);
        if started.elapsed() + delay >= policy.max_elapsed {
            return Err(RetryError::Exhausted {
                operation: operation.to_string(),
                attempts,
                error,
            });
        }

        last_error = Some(error);
        sleep(delay).await;
        interval = policy.next_interval(interval);
    }
}
