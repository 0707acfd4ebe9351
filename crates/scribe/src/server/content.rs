use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scribe_openai::AudioUpload;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::errors::{bad_request_response, error_response, openai_error_response};
use super::AppState;

#[derive(Debug, Serialize)]
pub(super) struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct GenerateContentRequest {
    transcription: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct GenerateContentResponse {
    content: String,
}

pub(super) async fn transcribe(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let Ok(mut multipart) = multipart else {
        return bad_request_response("No audio file provided");
    };

    let audio = match read_audio_field(&mut multipart).await {
        Ok(Some(audio)) => audio,
        Ok(None) => return bad_request_response("No audio file provided"),
        Err(err) => {
            return error_response(err.status(), "Failed to read upload", Some(err.body_text()));
        }
    };

    let client = match state.client() {
        Ok(client) => client,
        Err(response) => return response,
    };

    info!(
        filename = %audio.filename,
        size = audio.bytes.len(),
        key = %state.key_status(),
        "received audio file"
    );

    match client.transcribe(&audio).await {
        Ok(text) => {
            info!("transcription successful");
            Json(TranscriptionResponse { text }).into_response()
        }
        Err(err) => openai_error_response(err, "Internal server error during transcription"),
    }
}

/// First part named `audio`, if any
async fn read_audio_field(multipart: &mut Multipart) -> Result<Option<AudioUpload>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("audio") {
            continue;
        }
        let filename = field.file_name().unwrap_or("audio").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;
        return Ok(Some(AudioUpload::new(bytes.to_vec(), filename, content_type)));
    }
    Ok(None)
}

pub(super) async fn generate_content(
    State(state): State<AppState>,
    payload: Result<Json<GenerateContentRequest>, JsonRejection>,
) -> Response {
    let transcription = match payload {
        Ok(Json(GenerateContentRequest {
            transcription: Some(text),
        })) if !text.trim().is_empty() => text,
        Ok(_) => return bad_request_response("No transcription provided"),
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "No transcription provided",
                Some(rejection.body_text()),
            );
        }
    };

    let client = match state.client() {
        Ok(client) => client,
        Err(response) => return response,
    };

    match client.summarize(&transcription).await {
        Ok(content) => {
            info!("content generation successful");
            Json(GenerateContentResponse { content }).into_response()
        }
        Err(err) => openai_error_response(err, "Internal server error during content generation"),
    }
}
