//! Shared wiremock fixtures for OpenAI client tests

#![allow(dead_code)]

use scribe_core::types::{RetryOn, RetryPolicy, RuntimeConfig};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "sk-test-key";

/// Runtime config pointing at `server`, with millisecond backoff and no deadline
pub fn test_runtime(server: &MockServer, retry_on: RetryOn) -> RuntimeConfig {
    let mut runtime = RuntimeConfig::default();
    runtime.openai.api_key = Some(TEST_API_KEY.to_string());
    runtime.openai.base_url = server.uri();
    runtime.openai.retry_on = retry_on;
    runtime.network.request_deadline_secs = None;

    let quick = RetryPolicy {
        initial_delay_ms: 1,
        jitter: false,
        ..RetryPolicy::default()
    };
    runtime.retry_policies.default = quick.clone();
    for policy in runtime.retry_policies.operations.values_mut() {
        *policy = quick.clone();
    }
    runtime
}

/// Transcription endpoint answering with `text`
pub async fn mock_transcription(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(header("authorization", format!("Bearer {}", TEST_API_KEY).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": text })))
        .mount(server)
        .await;
}

/// `status` for the first `times` requests to `route` (mounted before the success mock)
pub async fn mock_failures(server: &MockServer, http_method: &str, route: &str, status: u16, times: u64) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({ "error": { "message": "upstream failure" } })),
        )
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// `status` for every request to `route`
pub async fn mock_always(server: &MockServer, http_method: &str, route: &str, status: u16) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({ "error": { "message": "upstream failure" } })),
        )
        .mount(server)
        .await;
}

/// Chat completion answering with a single choice
pub async fn mock_chat_completion(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
            ]
        })))
        .mount(server)
        .await;
}

/// Model listing with the given IDs
pub async fn mock_models(server: &MockServer, ids: &[&str]) {
    let data: Vec<_> = ids
        .iter()
        .map(|id| json!({ "id": id, "object": "model", "owned_by": "openai" }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": "list", "data": data })))
        .mount(server)
        .await;
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}
