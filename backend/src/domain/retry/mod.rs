//! Transient-fault retry executor for outbound vendor calls.
//!
//! Failures whose status is in the policy's transient set are retried with
//! exponential backoff plus jitter, or after exactly the server-supplied
//! `Retry-After` hint when one is present. Everything else propagates on the
//! first failure. Sleeping and jitter are injected so tests can observe delays
//! without waiting.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

mod runtime;

pub use runtime::{RandomJitter, RetryRuntime, TokioSleeper};

/// Failure shape inspected by the executor.
pub trait RetryableFailure {
    /// Upstream HTTP status, when the failure carries one.
    fn status(&self) -> Option<u16>;
    /// Server-supplied delay before the next attempt.
    fn retry_after(&self) -> Option<Duration>;
}

/// Retry parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Statuses considered transient.
    pub transient_statuses: Vec<u16>,
    /// Delay before the first retry, doubled for each later one.
    pub base_delay: Duration,
    /// Upper bound of the uniform jitter added to computed delays.
    pub jitter_bound: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            transient_statuses: vec![429, 500, 502, 503, 504],
            base_delay: Duration::from_secs(1),
            jitter_bound: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Whether `status` belongs to the transient set.
    #[must_use]
    pub fn is_transient(&self, status: u16) -> bool {
        self.transient_statuses.contains(&status)
    }

    /// Un-jittered delay before retry number `attempt` (zero based).
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use ddx_gateway::domain::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.backoff(0), Duration::from_secs(1));
    /// assert_eq!(policy.backoff(2), Duration::from_secs(4));
    /// ```
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }
}

/// Async sleeping abstraction for retries.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return `base` plus a jitter no larger than `bound`.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use ddx_gateway::domain::BackoffJitter;
    ///
    /// struct HalfBound;
    /// impl BackoffJitter for HalfBound {
    ///     fn jittered_delay(&self, base: Duration, bound: Duration) -> Duration {
    ///         base + bound / 2
    ///     }
    /// }
    /// let delay = HalfBound.jittered_delay(Duration::from_secs(1), Duration::from_millis(200));
    /// assert_eq!(delay, Duration::from_millis(1_100));
    /// ```
    fn jittered_delay(&self, base: Duration, bound: Duration) -> Duration;
}

/// Generic retry wrapper driven by a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn RetrySleeper>,
    jitter: Arc<dyn BackoffJitter>,
}

impl RetryExecutor {
    /// Build an executor that sleeps on the Tokio timer with random jitter.
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_runtime(policy, RetryRuntime::default())
    }

    /// Build an executor with injected runtime abstractions.
    pub fn with_runtime(policy: RetryPolicy, runtime: RetryRuntime) -> Self {
        Self {
            policy,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` until it succeeds, fails permanently, or the budget is spent.
    ///
    /// `label` identifies the upstream in log events.
    ///
    /// # Errors
    /// Returns the last failure produced by `op`.
    pub async fn run<F, Fut, T, E>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableFailure,
    {
        let mut attempt: u32 = 0;
        loop {
            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let Some(status) = error.status().filter(|s| self.policy.is_transient(*s)) else {
                return Err(error);
            };
            if attempt >= self.policy.max_retries {
                return Err(error);
            }

            let delay = match error.retry_after() {
                Some(hint) => hint,
                None => self
                    .jitter
                    .jittered_delay(self.policy.backoff(attempt), self.policy.jitter_bound),
            };
            warn!(
                upstream = label,
                attempt = attempt + 1,
                status,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying transient upstream failure"
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}
