//! Error type returned by the retry executor

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Outcome of a retried operation that did not succeed
///
/// Generic over `E`, the error produced by the wrapped operation. Every
/// variant that closes an attempt carries that attempt's error unchanged.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The attempt budget ran out
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error from the final attempt
        source: E,
        /// Wall time from the first attempt to giving up
        total_duration: Duration,
    },

    /// The retry predicate rejected the error
    NonRetryable {
        /// Attempt (1-indexed) that produced the error
        attempt: u32,
        /// The rejected error
        source: E,
    },

    /// The cancellation signal fired mid-attempt or during a backoff wait
    Cancelled {
        /// Attempts started before the signal fired
        attempts: u32,
        /// Error from the latest finished attempt, if any
        last_error: Option<E>,
    },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
            } => write!(
                f,
                "gave up after {} attempts over {:.2}s: {}",
                attempts,
                total_duration.as_secs_f64(),
                source
            ),
            RetryError::NonRetryable { attempt, source } => {
                write!(f, "non-retryable error on attempt {}: {}", attempt, source)
            }
            RetryError::Cancelled {
                attempts,
                last_error: Some(err),
            } => write!(f, "cancelled after {} attempts: {}", attempts, err),
            RetryError::Cancelled {
                attempts,
                last_error: None,
            } => write!(f, "cancelled after {} attempts", attempts),
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source_ref().map(|err| err as &(dyn Error + 'static))
    }
}

impl<E> RetryError<E> {
    pub fn exhausted(attempts: u32, source: E, total_duration: Duration) -> Self {
        RetryError::Exhausted {
            attempts,
            source,
            total_duration,
        }
    }

    pub fn non_retryable(attempt: u32, source: E) -> Self {
        RetryError::NonRetryable { attempt, source }
    }

    pub fn cancelled(attempts: u32, last_error: Option<E>) -> Self {
        RetryError::Cancelled {
            attempts,
            last_error,
        }
    }

    /// Number of attempts made before the executor stopped
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::NonRetryable { attempt, .. } => *attempt,
            RetryError::Cancelled { attempts, .. } => *attempts,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    pub fn is_non_retryable(&self) -> bool {
        matches!(self, RetryError::NonRetryable { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    /// Take the operation's error, if there is one
    pub fn into_source(self) -> Option<E> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::NonRetryable { source, .. } => Some(source),
            RetryError::Cancelled { last_error, .. } => last_error,
        }
    }

    /// Borrow the operation's error, if there is one
    pub fn source_ref(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::NonRetryable { source, .. } => Some(source),
            RetryError::Cancelled { last_error, .. } => last_error.as_ref(),
        }
    }

    /// Convert the wrapped error while keeping the variant
    pub fn map_err<F, E2>(self, f: F) -> RetryError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
            } => RetryError::Exhausted {
                attempts,
                source: f(source),
                total_duration,
            },
            RetryError::NonRetryable { attempt, source } => RetryError::NonRetryable {
                attempt,
                source: f(source),
            },
            RetryError::Cancelled {
                attempts,
                last_error,
            } => RetryError::Cancelled {
                attempts,
                last_error: last_error.map(f),
            },
        }
    }
}
