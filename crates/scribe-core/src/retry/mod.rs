//! Retry-with-backoff execution engine
//!
//! Wraps any fallible async operation and re-attempts it with a growing
//! delay, bounded by a `RetryPolicy`.
//!
//! - Strategies: none, fixed, exponential (default), linear; optional cap
//! - Optional absolute jitter drawn from `[0, max-jitter-ms)`
//! - `RetryPredicate` decides which errors earn another attempt
//! - `RetryObserver` hooks for logging and counting
//! - `Sleeper` makes the backoff clock injectable
//! - Cancellation through any `Future<Output = ()>`
//!
//! # Example
//!
//! ```rust,no_run
//! use scribe_core::retry::{RetryError, RetryExecutor};
//! use scribe_core::types::RetryPolicy;
//!
//! async fn example() -> Result<String, RetryError<std::io::Error>> {
//!     let executor = RetryExecutor::from_policy(RetryPolicy::default())
//!         .expect("default policy is valid");
//!
//!     executor
//!         .execute(|| async { Ok("done".to_string()) })
//!         .await
//! }
//! ```

mod attempt;
mod error;
mod executor;
mod observer;
mod sleeper;
mod strategies;

pub use attempt::RetryState;
pub use error::RetryError;
pub use executor::{RetryExecutor, RetryExecutorBuilder};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};
pub use strategies::{
    base_delay, calculate_delay, AlwaysRetry, ClosurePredicate, HttpStatusError,
    HttpStatusPredicate, MessagePredicate, NeverRetry, RetryPredicate,
};
