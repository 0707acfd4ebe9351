//! Retry execution engine
//!
//! One executor serves every call site: the caller hands it a closure that
//! builds a fresh future per attempt, and the executor decides after each
//! failure whether to wait and try again.

use std::error::Error;
use std::future::Future;
use std::time::Instant;

use crate::error::Result;
use crate::types::RetryPolicy;

use super::attempt::RetryAttempt;
use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver};
use super::sleeper::{Sleeper, TokioSleeper};
use super::strategies::{calculate_delay, AlwaysRetry, RetryPredicate};

/// Builder for a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use scribe_core::retry::{HttpStatusPredicate, RetryExecutorBuilder, TracingObserver};
/// use scribe_core::types::RetryPolicy;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::default())
///     .with_predicate(HttpStatusPredicate::rate_limit_only())
///     .with_observer(TracingObserver::new("transcription"))
///     .build()
///     .unwrap();
/// assert_eq!(executor.policy().max_attempts, 3);
/// ```
pub struct RetryExecutorBuilder<P = AlwaysRetry, O = NoOpObserver, S = TokioSleeper> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    sleeper: S,
}

impl Default for RetryExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder {
    /// Default policy, retry everything, no observation, tokio timer
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            predicate: AlwaysRetry,
            observer: NoOpObserver,
            sleeper: TokioSleeper,
        }
    }
}

impl<P, O, S> RetryExecutorBuilder<P, O, S> {
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the policy's jitter flag
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.policy.jitter = jitter;
        self
    }

    pub fn with_predicate<P2>(self, predicate: P2) -> RetryExecutorBuilder<P2, O, S> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate,
            observer: self.observer,
            sleeper: self.sleeper,
        }
    }

    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<P, O2, S> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate: self.predicate,
            observer,
            sleeper: self.sleeper,
        }
    }

    /// Replace the clock used for backoff waits
    pub fn with_sleeper<S2>(self, sleeper: S2) -> RetryExecutorBuilder<P, O, S2> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate: self.predicate,
            observer: self.observer,
            sleeper,
        }
    }

    /// Validate the policy and build the executor
    pub fn build(self) -> Result<RetryExecutor<P, O, S>> {
        self.policy.validate()?;
        Ok(RetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer: self.observer,
            sleeper: self.sleeper,
        })
    }
}

/// Runs fallible async operations under a retry policy
///
/// Holds only immutable configuration; concurrent `execute` calls share
/// nothing.
pub struct RetryExecutor<P = AlwaysRetry, O = NoOpObserver, S = TokioSleeper> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    sleeper: S,
}

impl RetryExecutor {
    /// Executor that retries every error under `policy`
    pub fn from_policy(policy: RetryPolicy) -> Result<Self> {
        RetryExecutorBuilder::new().with_policy(policy).build()
    }
}

impl<P, O, S> RetryExecutor<P, O, S>
where
    O: RetryObserver,
    S: Sleeper,
{
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` until it succeeds, the predicate rejects its error, or the
    /// attempt budget runs out
    pub async fn execute<F, Fut, T, E>(&self, op: F) -> std::result::Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Error,
        P: RetryPredicate<E>,
    {
        self.execute_with_cancel(op, std::future::pending()).await
    }

    /// Like [`execute`](Self::execute), but abandons the sequence as soon as
    /// `cancel` completes
    ///
    /// The signal is checked while an attempt is in flight and during every
    /// backoff wait. An in-flight attempt is dropped.
    pub async fn execute_with_cancel<F, Fut, T, E, C>(
        &self,
        mut op: F,
        cancel: C,
    ) -> std::result::Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Error,
        P: RetryPredicate<E>,
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let start = Instant::now();
        let max_attempts = self.policy.max_attempts;
        let mut attempt: RetryAttempt<E> = RetryAttempt::new(max_attempts);

        loop {
            let number = attempt.number();
            self.observer.on_attempt_start(number, max_attempts);

            let outcome = tokio::select! {
                biased;
                _ = &mut cancel => None,
                result = op() => Some(result),
            };

            let err = match outcome {
                None => return Err(self.cancelled(&mut attempt, number)),
                Some(Ok(value)) => {
                    attempt.succeed();
                    self.observer.on_success(number, start.elapsed());
                    return Ok(value);
                }
                Some(Err(err)) => err,
            };

            if attempt.is_last() {
                attempt.give_up();
                self.observer.on_exhausted(number, &err);
                return Err(RetryError::exhausted(number, err, start.elapsed()));
            }

            if !self.predicate.should_retry(&err) {
                attempt.give_up();
                self.observer.on_non_retryable(number, &err);
                return Err(RetryError::non_retryable(number, err));
            }

            let delay = calculate_delay(&self.policy, number);
            self.observer.on_attempt_failed(number, &err, delay);
            attempt.retry(err);
            tracing::trace!(state = ?attempt.state(), delay_ms = delay.as_millis() as u64, "backing off");

            if !delay.is_zero() {
                let cancelled = tokio::select! {
                    biased;
                    _ = &mut cancel => true,
                    _ = self.sleeper.sleep(delay) => false,
                };
                if cancelled {
                    return Err(self.cancelled(&mut attempt, number));
                }
            }
        }
    }

    fn cancelled<E: Error>(&self, attempt: &mut RetryAttempt<E>, attempts: u32) -> RetryError<E> {
        let last_error = attempt.cancel();
        self.observer
            .on_cancelled(attempts, last_error.as_ref().map(|err| err as &dyn Error));
        RetryError::cancelled(attempts, last_error)
    }
}
