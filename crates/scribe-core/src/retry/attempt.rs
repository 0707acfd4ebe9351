//! Per-execution attempt bookkeeping

/// Lifecycle of one retried execution
///
/// `Attempting` holds the 0-based index of the attempt in flight. `Succeeded`
/// and `Failed` are terminal: no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting(u32),
    Succeeded,
    Failed,
}

impl RetryState {
    /// The attempt in flight returned a value
    pub fn succeed(self) -> Self {
        match self {
            RetryState::Attempting(_) => RetryState::Succeeded,
            terminal => terminal,
        }
    }

    /// The attempt in flight failed
    ///
    /// Moves to the next attempt only when the failure is retryable and the
    /// budget allows another one.
    pub fn fail(self, retryable: bool, max_attempts: u32) -> Self {
        match self {
            RetryState::Attempting(index) if retryable && index + 1 < max_attempts => {
                RetryState::Attempting(index + 1)
            }
            RetryState::Attempting(_) => RetryState::Failed,
            terminal => terminal,
        }
    }

    /// The cancellation signal fired
    pub fn cancel(self) -> Self {
        match self {
            RetryState::Attempting(_) => RetryState::Failed,
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryState::Attempting(_))
    }
}

/// Mutable state of a single `execute` call, dropped when it returns
#[derive(Debug)]
pub(crate) struct RetryAttempt<E> {
    state: RetryState,
    max_attempts: u32,
    last_error: Option<E>,
}

impl<E> RetryAttempt<E> {
    pub(crate) fn new(max_attempts: u32) -> Self {
        Self {
            state: RetryState::Attempting(0),
            max_attempts,
            last_error: None,
        }
    }

    pub(crate) fn state(&self) -> RetryState {
        self.state
    }

    /// 1-indexed number of the current (or final) attempt
    pub(crate) fn number(&self) -> u32 {
        match self.state {
            RetryState::Attempting(index) => index + 1,
            _ => self.max_attempts,
        }
    }

    pub(crate) fn is_last(&self) -> bool {
        matches!(self.state, RetryState::Attempting(index) if index + 1 >= self.max_attempts)
    }

    pub(crate) fn succeed(&mut self) {
        self.state = self.state.succeed();
    }

    /// Record a retryable failure and move to the next attempt
    pub(crate) fn retry(&mut self, error: E) {
        self.state = self.state.fail(true, self.max_attempts);
        self.last_error = Some(error);
    }

    /// Record a failure that ends the execution
    pub(crate) fn give_up(&mut self) {
        self.state = self.state.fail(false, self.max_attempts);
    }

    /// End the execution on cancellation, handing back the last error
    pub(crate) fn cancel(&mut self) -> Option<E> {
        self.state = self.state.cancel();
        self.last_error.take()
    }
}
