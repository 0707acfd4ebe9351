//! Error types for OpenAI calls

use scribe_core::retry::{HttpStatusError, RetryError};
use thiserror::Error;

/// Result of a retried OpenAI operation
pub type OpenAiResult<T> = std::result::Result<T, RetryError<OpenAiError>>;

/// Failure of a single OpenAI request, or of client construction
#[derive(Debug, Error)]
pub enum OpenAiError {
    /// Non-2xx response; `details` is the raw response body
    #[error("{context} failed: {status_text}")]
    Api {
        context: &'static str,
        status: u16,
        status_text: String,
        details: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response from OpenAI: {0}")]
    InvalidResponse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("OpenAI API key is not configured (set OPENAI_API_KEY)")]
    MissingApiKey,

    #[error(transparent)]
    Config(#[from] scribe_core::Error),
}

impl OpenAiError {
    /// HTTP status reported by the API, if the request got that far
    pub fn status_code(&self) -> Option<u16> {
        match self {
            OpenAiError::Api { status, .. } => Some(*status),
            OpenAiError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// HTTP 429, or an error whose message says "Too Many Requests"
    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429) || self.to_string().contains("Too Many Requests")
    }

    /// Rate limits, request timeouts, server errors and connection failures
    pub fn is_transient(&self) -> bool {
        if self.is_rate_limited() {
            return true;
        }
        match self {
            OpenAiError::Api { status, .. } => *status == 408 || *status >= 500,
            OpenAiError::Transport(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            _ => false,
        }
    }

    /// Raw upstream body for API errors, otherwise the message
    pub fn details(&self) -> String {
        match self {
            OpenAiError::Api { details, .. } => details.clone(),
            other => other.to_string(),
        }
    }
}

impl HttpStatusError for OpenAiError {
    fn status_code(&self) -> Option<u16> {
        OpenAiError::status_code(self)
    }
}
