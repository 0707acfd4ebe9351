//! OpenAI HTTP client
//!
//! Each public operation builds a request closure and hands it to a
//! `RetryExecutor` configured from the named retry policy for that operation.
//! The optional whole-request deadline acts as the executor's cancellation
//! signal.

use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use scribe_core::retry::{RetryExecutor, RetryExecutorBuilder, TracingObserver};
use scribe_core::types::{OpenAiConfig, RuntimeConfig, OP_CHAT_COMPLETION, OP_LIST_MODELS, OP_TRANSCRIPTION};

use crate::error::{OpenAiError, OpenAiResult};
use crate::models::{
    AudioUpload, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ModelList,
    TranscriptionResponse,
};
use crate::predicate::OpenAiRetryPredicate;
use crate::prompts::{summary_request, SUMMARY_SYSTEM_PROMPT};

type Executor = RetryExecutor<OpenAiRetryPredicate, TracingObserver>;

/// Client for the transcription, chat-completion and model-listing endpoints
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
    api_key: String,
    deadline: Option<Duration>,
    transcription: Executor,
    chat: Executor,
    models: Executor,
}

impl OpenAiClient {
    /// Build a client; fails when no API key is configured
    pub fn new(runtime: &RuntimeConfig) -> Result<Self, OpenAiError> {
        let api_key = runtime
            .openai
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(OpenAiError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .user_agent(&runtime.network.user_agent)
            .timeout(Duration::from_secs(runtime.network.attempt_timeout_secs))
            .build()?;

        let predicate = OpenAiRetryPredicate::new(runtime.openai.retry_on);
        let executor = |operation: &str| -> Result<Executor, OpenAiError> {
            Ok(RetryExecutorBuilder::new()
                .with_policy(runtime.retry_policies.for_operation(operation).clone())
                .with_predicate(predicate)
                .with_observer(TracingObserver::new(operation))
                .build()?)
        };

        Ok(Self {
            transcription: executor(OP_TRANSCRIPTION)?,
            chat: executor(OP_CHAT_COMPLETION)?,
            models: executor(OP_LIST_MODELS)?,
            http,
            config: runtime.openai.clone(),
            api_key,
            deadline: runtime.network.request_deadline_secs.map(Duration::from_secs),
        })
    }

    /// Transcribe an audio file, returning the recognized text
    pub async fn transcribe(&self, audio: &AudioUpload) -> OpenAiResult<String> {
        info!(
            filename = %audio.filename,
            size = audio.bytes.len(),
            "transcribing audio"
        );
        let url = self.endpoint("audio/transcriptions");
        let url = url.as_str();

        self.transcription
            .execute_with_cancel(move || self.send_transcription(url, audio), self.deadline())
            .await
    }

    /// Transcribe the built-in silent clip
    pub async fn probe_whisper(&self) -> OpenAiResult<String> {
        let probe = AudioUpload::silent_probe()
            .map_err(|err| scribe_core::retry::RetryError::non_retryable(1, err))?;
        self.transcribe(&probe).await
    }

    /// Summarize a transcription with the chat model
    pub async fn summarize(&self, transcription: &str) -> OpenAiResult<String> {
        info!(chars = transcription.len(), "generating summary");
        let url = self.endpoint("chat/completions");
        let url = url.as_str();

        self.chat
            .execute_with_cancel(move || self.send_summary(url, transcription), self.deadline())
            .await
    }

    /// IDs of the models visible to this API key
    pub async fn list_models(&self) -> OpenAiResult<Vec<String>> {
        let url = self.endpoint("models");
        let url = url.as_str();

        self.models
            .execute_with_cancel(move || self.send_list_models(url), self.deadline())
            .await
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn deadline(&self) -> impl Future<Output = ()> + Send + 'static {
        let deadline = self.deadline;
        async move {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        }
    }

    async fn send_transcription(&self, url: &str, audio: &AudioUpload) -> Result<String, OpenAiError> {
        let file = Part::bytes(audio.bytes.clone())
            .file_name(audio.filename.clone())
            .mime_str(&audio.content_type)
            .map_err(|_| {
                OpenAiError::InvalidRequest(format!("invalid content type {}", audio.content_type))
            })?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.config.transcription_model.clone());

        debug!(url, model = %self.config.transcription_model, "POST transcription");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let body: TranscriptionResponse = read_json(response, "Transcription").await?;
        Ok(body.text)
    }

    async fn send_summary(&self, url: &str, transcription: &str) -> Result<String, OpenAiError> {
        let request = ChatCompletionRequest {
            model: &self.config.chat_model,
            messages: vec![
                ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
                ChatMessage::user(summary_request(transcription)),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(url, model = %self.config.chat_model, "POST chat completion");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: ChatCompletionResponse = read_json(response, "Content generation").await?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| OpenAiError::InvalidResponse("response contained no choices".to_string()))
    }

    async fn send_list_models(&self, url: &str) -> Result<Vec<String>, OpenAiError> {
        debug!(url, "GET models");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let body: ModelList = read_json(response, "Model listing").await?;
        Ok(body.data.into_iter().map(|model| model.id).collect())
    }
}

/// Turn a response into `T`, or into `OpenAiError::Api` when the status is not 2xx
async fn read_json<T: DeserializeOwned>(
    response: Response,
    context: &'static str,
) -> Result<T, OpenAiError> {
    let status = response.status();
    if !status.is_success() {
        let status_text = status.canonical_reason().unwrap_or("Unknown Status").to_string();
        let details = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            status_text = %status_text,
            details = %details,
            "{} request rejected",
            context
        );
        return Err(OpenAiError::Api {
            context,
            status: status.as_u16(),
            status_text,
            details,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|err| OpenAiError::InvalidResponse(format!("{}: {}", context, err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime_with_key(key: Option<&str>) -> RuntimeConfig {
        let mut runtime = RuntimeConfig::default();
        runtime.openai.api_key = key.map(str::to_string);
        runtime
    }

    #[test]
    fn test_missing_api_key_rejected() {
        assert!(matches!(
            OpenAiClient::new(&runtime_with_key(None)),
            Err(OpenAiError::MissingApiKey)
        ));
        assert!(matches!(
            OpenAiClient::new(&runtime_with_key(Some("  "))),
            Err(OpenAiError::MissingApiKey)
        ));
    }

    #[test]
    fn test_invalid_policy_rejected_at_construction() {
        let mut runtime = runtime_with_key(Some("sk-test"));
        runtime
            .retry_policies
            .operations
            .get_mut(OP_TRANSCRIPTION)
            .unwrap()
            .max_attempts = 0;

        assert!(matches!(
            OpenAiClient::new(&runtime),
            Err(OpenAiError::Config(_))
        ));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let mut runtime = runtime_with_key(Some("sk-test"));
        runtime.openai.base_url = "http://localhost:1234/v1/".to_string();
        let client = OpenAiClient::new(&runtime).unwrap();

        assert_eq!(
            client.endpoint("audio/transcriptions"),
            "http://localhost:1234/v1/audio/transcriptions"
        );
    }
}
