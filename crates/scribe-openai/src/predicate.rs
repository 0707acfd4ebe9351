use scribe_core::retry::RetryPredicate;
use scribe_core::types::RetryOn;

use crate::error::OpenAiError;

/// Classifies OpenAI failures according to the configured `retry-on` mode
#[derive(Debug, Clone, Copy)]
pub struct OpenAiRetryPredicate {
    retry_on: RetryOn,
}

impl OpenAiRetryPredicate {
    pub fn new(retry_on: RetryOn) -> Self {
        Self { retry_on }
    }
}

impl RetryPredicate<OpenAiError> for OpenAiRetryPredicate {
    fn should_retry(&self, error: &OpenAiError) -> bool {
        // Configuration problems never heal between attempts
        if matches!(
            error,
            OpenAiError::MissingApiKey | OpenAiError::Config(_) | OpenAiError::InvalidRequest(_)
        ) {
            return false;
        }

        match self.retry_on {
            RetryOn::RateLimit => error.is_rate_limited(),
            RetryOn::Transient => error.is_transient(),
            RetryOn::Any => true,
        }
    }
}
