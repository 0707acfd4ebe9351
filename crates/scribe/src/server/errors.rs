use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scribe_core::retry::RetryError;
use scribe_openai::OpenAiError;
use serde::Serialize;
use tracing::error;

pub(super) const RATE_LIMIT_ERROR: &str = "Rate limit exceeded. Please wait a moment and try again.";
pub(super) const RATE_LIMIT_DETAILS: &str =
    "OpenAI API rate limit reached. Consider upgrading your plan for higher limits.";

#[derive(Debug, Serialize)]
pub(super) struct ErrorBody {
    pub(super) error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) details: Option<String>,
}

pub(super) fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

pub(super) fn bad_request_response(message: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, message, None)
}

pub(super) fn not_found_response() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", None)
}

pub(super) fn missing_key_response() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "OpenAI API key is not configured",
        Some("Set OPENAI_API_KEY in the environment or openai.api-key in the config file".to_string()),
    )
}

/// Map the outcome of a retried OpenAI call onto an HTTP response
///
/// Rate limits become 429, upstream rejections keep their status, deadline
/// cancellation becomes 504 and anything else is a 500.
pub(super) fn openai_error_response(err: RetryError<OpenAiError>, fallback: &str) -> Response {
    error!("{}: {}", fallback, err);

    let attempts = err.attempts();
    let cancelled = err.is_cancelled();
    let Some(source) = err.into_source() else {
        return error_response(
            StatusCode::GATEWAY_TIMEOUT,
            "Request to OpenAI timed out",
            Some(format!("No response before the deadline ({} attempts)", attempts)),
        );
    };

    if cancelled {
        return error_response(
            StatusCode::GATEWAY_TIMEOUT,
            "Request to OpenAI timed out",
            Some(source.to_string()),
        );
    }

    if source.is_rate_limited() {
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            RATE_LIMIT_ERROR,
            Some(RATE_LIMIT_DETAILS.to_string()),
        );
    }

    let status = match &source {
        OpenAiError::Api { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = source.to_string();
    let message = if message.is_empty() { fallback.to_string() } else { message };
    error_response(status, &message, Some(source.details()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn api(status: u16, status_text: &str, details: &str) -> OpenAiError {
        OpenAiError::Api {
            context: "Transcription",
            status,
            status_text: status_text.to_string(),
            details: details.to_string(),
        }
    }

    #[test]
    fn test_rate_limit_maps_to_429() {
        let err = RetryError::exhausted(3, api(429, "Too Many Requests", "{}"), Duration::from_secs(6));
        let response = openai_error_response(err, "Transcription error");
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_upstream_status_is_kept() {
        let err = RetryError::non_retryable(1, api(401, "Unauthorized", "bad key"));
        let response = openai_error_response(err, "Transcription error");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_invalid_response_is_500() {
        let err = RetryError::non_retryable(1, OpenAiError::InvalidResponse("empty".to_string()));
        let response = openai_error_response(err, "Content generation error");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_cancelled_is_504() {
        let err: RetryError<OpenAiError> = RetryError::cancelled(1, None);
        assert_eq!(
            openai_error_response(err, "x").status(),
            StatusCode::GATEWAY_TIMEOUT
        );

        let err = RetryError::cancelled(2, Some(api(429, "Too Many Requests", "")));
        assert_eq!(
            openai_error_response(err, "x").status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
