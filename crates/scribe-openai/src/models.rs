//! Request and response bodies for the OpenAI endpoints in use

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::OpenAiError;

/// 44-byte WAV header with no samples, used to probe the transcription endpoint
const SILENT_WAV_BASE64: &str = "UklGRiQAAABXQVZFZm10IBAAAAABAAEARKwAAIhYAQACABAAZGF0YQAAAAA=";

/// Audio file sent for transcription
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

impl AudioUpload {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Silent clip for checking that transcription works end to end
    pub fn silent_probe() -> Result<Self, OpenAiError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(SILENT_WAV_BASE64)
            .map_err(|e| OpenAiError::InvalidRequest(format!("probe clip: {}", e)))?;
        Ok(Self::new(bytes, "test.wav", "audio/wav"))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranscriptionResponse {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatResponseMessage,
}

/// Assistant message; `content` is null for refusals and tool calls
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelInfo {
    pub id: String,
}
