use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scribe_core::retry::RetryError;
use scribe_openai::OpenAiError;
use serde_json::json;
use tracing::warn;

use super::AppState;

/// Lists models to prove the API key works
pub(super) async fn test_openai(State(state): State<AppState>) -> Response {
    let Some(client) = state.openai.as_ref() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to test OpenAI API",
                "details": OpenAiError::MissingApiKey.to_string(),
                "keyStatus": "Missing",
            })),
        )
            .into_response();
    };

    let err = match client.list_models().await {
        Ok(models) => {
            return Json(json!({
                "status": "OpenAI API Key Working",
                "modelsCount": models.len(),
                "keyStatus": "Valid",
            }))
            .into_response();
        }
        Err(err) => err,
    };

    warn!("OpenAI key check failed: {}", err);
    if err.is_cancelled() {
        return deadline_response("Failed to test OpenAI API", "keyStatus", "Present but Error", &err);
    }
    match err.into_source() {
        Some(OpenAiError::Api {
            status,
            status_text,
            details,
            ..
        }) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(json!({
                "error": format!("OpenAI API Error: {}", status_text),
                "details": details,
                "keyStatus": "Present",
            })),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to test OpenAI API",
                "details": other.map(|e| e.to_string()).unwrap_or_else(|| "request deadline reached".to_string()),
                "keyStatus": "Present but Error",
            })),
        )
            .into_response(),
    }
}

/// Transcribes a silent clip to prove the transcription endpoint works
pub(super) async fn test_whisper(State(state): State<AppState>) -> Response {
    let Some(client) = state.openai.as_ref() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to test Whisper API",
                "details": OpenAiError::MissingApiKey.to_string(),
                "whisperStatus": "Error",
            })),
        )
            .into_response();
    };

    let err = match client.probe_whisper().await {
        Ok(transcription) => {
            return Json(json!({
                "status": "Whisper API Working",
                "transcription": transcription,
                "whisperStatus": "Valid",
            }))
            .into_response();
        }
        Err(err) => err,
    };

    warn!("Whisper check failed: {}", err);
    if err.is_cancelled() {
        return deadline_response("Failed to test Whisper API", "whisperStatus", "Error", &err);
    }
    match err.into_source() {
        Some(OpenAiError::Api {
            status,
            status_text,
            details,
            ..
        }) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(json!({
                "error": format!("Whisper API Error: {}", status_text),
                "details": details,
                "whisperStatus": "Failed",
            })),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to test Whisper API",
                "details": other.map(|e| e.to_string()).unwrap_or_else(|| "request deadline reached".to_string()),
                "whisperStatus": "Error",
            })),
        )
            .into_response(),
    }
}

/// 504 for a check abandoned at the request deadline, whatever the last upstream answer was
fn deadline_response(
    error: &str,
    status_key: &str,
    status_value: &str,
    err: &RetryError<OpenAiError>,
) -> Response {
    let mut body = json!({
        "error": error,
        "details": format!("request deadline reached after {} attempts", err.attempts()),
    });
    body[status_key] = json!(status_value);
    (StatusCode::GATEWAY_TIMEOUT, Json(body)).into_response()
}
