//! Backoff delay calculation and retry predicates

use crate::types::{RetryPolicy, RetryStrategy};
use rand::RngExt;
use std::error::Error;
use std::time::Duration;

/// Delay owed after a failed attempt, before jitter
///
/// `attempt` is the 1-indexed number of the attempt that just failed, so the
/// exponential schedule is `initial * multiplier^(attempt - 1)`.
///
/// ```rust
/// use scribe_core::retry::base_delay;
/// use scribe_core::types::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(base_delay(&policy, 1).as_millis(), 1000);
/// assert_eq!(base_delay(&policy, 2).as_millis(), 2000);
/// ```
pub fn base_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let attempt_index = attempt.saturating_sub(1);

    let delay_ms = match policy.strategy {
        RetryStrategy::None => 0,

        RetryStrategy::FixedDelay => policy.initial_delay_ms,

        RetryStrategy::ExponentialBackoff => {
            let factor = policy.backoff_multiplier.powf(f64::from(attempt_index));
            // f64 -> u64 casts saturate
            (policy.initial_delay_ms as f64 * factor) as u64
        }

        RetryStrategy::LinearBackoff => policy
            .initial_delay_ms
            .saturating_mul(u64::from(attempt_index) + 1),
    };

    let delay_ms = match policy.max_delay_ms {
        Some(cap) => delay_ms.min(cap),
        None => delay_ms,
    };

    Duration::from_millis(delay_ms)
}

/// Delay to wait after a failed attempt, including jitter when enabled
///
/// Jitter is an absolute extra drawn uniformly from `[0, max_jitter_ms)` and
/// is added after the cap.
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let delay = base_delay(policy, attempt);

    if policy.jitter && policy.max_jitter_ms > 0 {
        let extra = rand::rng().random_range(0..policy.max_jitter_ms);
        delay.saturating_add(Duration::from_millis(extra))
    } else {
        delay
    }
}

/// Decides whether a failed attempt is worth another try
///
/// ```rust
/// use scribe_core::retry::RetryPredicate;
/// use std::io::{Error, ErrorKind};
///
/// struct Transient;
///
/// impl RetryPredicate<Error> for Transient {
///     fn should_retry(&self, error: &Error) -> bool {
///         matches!(error.kind(), ErrorKind::TimedOut | ErrorKind::ConnectionReset)
///     }
/// }
/// ```
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    fn should_retry(&self, error: &E) -> bool;
}

/// Retry every error
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

/// Retry nothing
#[derive(Debug, Clone, Copy)]
pub struct NeverRetry;

impl<E: ?Sized> RetryPredicate<E> for NeverRetry {
    fn should_retry(&self, _error: &E) -> bool {
        false
    }
}

/// Predicate backed by a closure
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}

/// Errors that may carry an HTTP status code
pub trait HttpStatusError {
    fn status_code(&self) -> Option<u16>;
}

/// Retry based on the HTTP status carried by the error
#[derive(Debug, Clone)]
pub struct HttpStatusPredicate {
    retryable_codes: Vec<u16>,
    /// Verdict for errors without a status (transport failures)
    retry_without_status: bool,
}

impl HttpStatusPredicate {
    /// 408, 425, 429, 500, 502, 503 and 504, plus errors without a status
    pub fn default_http() -> Self {
        Self {
            retryable_codes: vec![408, 425, 429, 500, 502, 503, 504],
            retry_without_status: true,
        }
    }

    /// Only HTTP 429; errors without a status are not retried
    pub fn rate_limit_only() -> Self {
        Self {
            retryable_codes: vec![429],
            retry_without_status: false,
        }
    }

    pub fn with_codes(codes: Vec<u16>) -> Self {
        Self {
            retryable_codes: codes,
            retry_without_status: true,
        }
    }

    /// Set the verdict for errors that carry no status
    pub fn retry_without_status(mut self, retry: bool) -> Self {
        self.retry_without_status = retry;
        self
    }

    pub fn is_retryable_code(&self, code: u16) -> bool {
        self.retryable_codes.contains(&code)
    }
}

impl<E: HttpStatusError> RetryPredicate<E> for HttpStatusPredicate {
    fn should_retry(&self, error: &E) -> bool {
        error
            .status_code()
            .map(|code| self.is_retryable_code(code))
            .unwrap_or(self.retry_without_status)
    }
}

/// Retry when the error message contains one of the patterns (case-insensitive)
#[derive(Debug, Clone)]
pub struct MessagePredicate {
    retryable_patterns: Vec<String>,
}

impl MessagePredicate {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            retryable_patterns: patterns
                .into_iter()
                .map(|pattern| pattern.to_lowercase())
                .collect(),
        }
    }

    /// Rate-limit wording used by HTTP APIs
    pub fn rate_limit() -> Self {
        Self::new(vec![
            "too many requests".to_string(),
            "rate limit".to_string(),
        ])
    }

    /// Common network failure wording
    pub fn network_errors() -> Self {
        Self::new(vec![
            "timeout".to_string(),
            "timed out".to_string(),
            "connection reset".to_string(),
            "connection refused".to_string(),
            "network unreachable".to_string(),
            "temporary failure".to_string(),
        ])
    }
}

impl<E: Error> RetryPredicate<E> for MessagePredicate {
    fn should_retry(&self, error: &E) -> bool {
        let message = error.to_string().to_lowercase();
        self.retryable_patterns
            .iter()
            .any(|pattern| message.contains(pattern))
    }
}
