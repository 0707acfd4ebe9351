//! Retry event callbacks
//!
//! `RetryObserver` receives one callback per lifecycle event of an execution.
//! `TracingObserver` turns them into log lines; `StatsObserver` counts them.

use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Receives retry lifecycle events
///
/// Attempt numbers are 1-indexed.
///
/// # Example
///
/// ```rust
/// use scribe_core::retry::RetryObserver;
/// use std::error::Error;
/// use std::time::Duration;
///
/// struct PrintObserver;
///
/// impl RetryObserver for PrintObserver {
///     fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
///         println!("attempt {}/{}", attempt, max_attempts);
///     }
///
///     fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
///         println!("attempt {} failed: {}; waiting {:?}", attempt, error, delay);
///     }
///
///     fn on_success(&self, _attempt: u32, _total_duration: Duration) {}
///
///     fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Error) {}
/// }
/// ```
pub trait RetryObserver: Send + Sync {
    /// An attempt is about to run
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// An attempt failed and another one follows after `delay`
    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration);

    /// The operation returned a value
    fn on_success(&self, attempt: u32, total_duration: Duration);

    /// The final attempt failed
    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error);

    /// The predicate rejected an error; no further attempts
    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        let _ = (attempt, error);
    }

    /// The cancellation signal fired
    fn on_cancelled(&self, attempts: u32, last_error: Option<&dyn Error>) {
        let _ = (attempts, last_error);
    }
}

/// Ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Error, _delay: Duration) {}

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Error) {}
}

/// Logs retry events through `tracing`
///
/// Attempt starts and first-try successes go to DEBUG, retried failures and
/// cancellations to WARN, exhaustion to ERROR.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            operation = %self.operation,
            attempt,
            max_attempts,
            "starting attempt"
        );
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, retrying"
        );
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt,
                total_duration_ms = total_duration.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = total_duration.as_millis() as u64,
                "succeeded on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        tracing::error!(
            operation = %self.operation,
            attempts,
            error = %final_error,
            "all attempts failed"
        );
    }

    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            error = %error,
            "error is not retryable"
        );
    }

    fn on_cancelled(&self, attempts: u32, last_error: Option<&dyn Error>) {
        match last_error {
            Some(err) => tracing::warn!(
                operation = %self.operation,
                attempts,
                error = %err,
                "retry cancelled"
            ),
            None => tracing::warn!(
                operation = %self.operation,
                attempts,
                "retry cancelled"
            ),
        }
    }
}

/// Counts retry events
#[derive(Debug, Default)]
pub struct StatsObserver {
    attempt_starts: AtomicU32,
    failures: AtomicU32,
    successes: AtomicU32,
    exhaustions: AtomicU32,
    non_retryables: AtomicU32,
    cancellations: AtomicU32,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    /// Failures that were followed by another attempt
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    pub fn non_retryables(&self) -> u32 {
        self.non_retryables.load(Ordering::SeqCst)
    }

    pub fn cancellations(&self) -> u32 {
        self.cancellations.load(Ordering::SeqCst)
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Error, _delay: Duration) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Error) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_non_retryable(&self, _attempt: u32, _error: &dyn Error) {
        self.non_retryables.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cancelled(&self, _attempts: u32, _last_error: Option<&dyn Error>) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        (**self).on_attempt_failed(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        (**self).on_exhausted(attempts, final_error)
    }

    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        (**self).on_non_retryable(attempt, error)
    }

    fn on_cancelled(&self, attempts: u32, last_error: Option<&dyn Error>) {
        (**self).on_cancelled(attempts, last_error)
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Box<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        (**self).on_attempt_failed(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        (**self).on_exhausted(attempts, final_error)
    }

    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        (**self).on_non_retryable(attempt, error)
    }

    fn on_cancelled(&self, attempts: u32, last_error: Option<&dyn Error>) {
        (**self).on_cancelled(attempts, last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_stats_observer_counts_each_event() {
        let observer = StatsObserver::new();
        let error = io::Error::other("429 Too Many Requests");

        observer.on_attempt_start(1, 3);
        observer.on_attempt_failed(1, &error, Duration::from_millis(1000));
        observer.on_attempt_start(2, 3);
        observer.on_non_retryable(2, &error);

        assert_eq!(observer.attempt_starts(), 2);
        assert_eq!(observer.failures(), 1);
        assert_eq!(observer.non_retryables(), 1);
        assert_eq!(observer.successes(), 0);
        assert_eq!(observer.exhaustions(), 0);
        assert_eq!(observer.cancellations(), 0);
    }

    #[test]
    fn test_default_hooks_are_optional() {
        let observer = NoOpObserver;
        let error = io::Error::other("boom");

        observer.on_non_retryable(1, &error);
        observer.on_cancelled(1, None);
    }

    #[test]
    fn test_tracing_observer_operation_name() {
        assert_eq!(TracingObserver::new("transcription").operation(), "transcription");
        assert_eq!(TracingObserver::default().operation(), "retry");
    }

    #[test]
    fn test_boxed_observer_forwards() {
        let stats = Arc::new(StatsObserver::new());
        let boxed: Box<dyn RetryObserver> = Box::new(stats.clone());
        let error = io::Error::other("boom");

        boxed.on_exhausted(3, &error);
        boxed.on_cancelled(2, Some(&error));

        assert_eq!(stats.exhaustions(), 1);
        assert_eq!(stats.cancellations(), 1);
    }
}
