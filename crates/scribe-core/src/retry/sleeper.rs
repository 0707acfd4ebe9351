//! Injectable clock for backoff waits

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Suspends the current task for a backoff delay
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Records requested delays and returns immediately
///
/// Lets tests assert on the backoff schedule without waiting for it.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    pub fn delays(&self) -> Vec<Duration> {
        match self.delays.lock() {
            Ok(delays) => delays.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        match self.delays.lock() {
            Ok(mut delays) => delays.push(delay),
            Err(poisoned) => poisoned.into_inner().push(delay),
        }
    }
}

#[async_trait]
impl<T: Sleeper + ?Sized> Sleeper for Arc<T> {
    async fn sleep(&self, delay: Duration) {
        (**self).sleep(delay).await
    }
}
