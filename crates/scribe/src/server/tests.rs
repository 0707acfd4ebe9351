//! End-to-end proxy tests: a real listener in front of a wiremock upstream

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use scribe_core::types::{RetryOn, RetryPolicy};
use scribe_core::RuntimeConfig;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{build_router, AppState};

fn runtime_for(upstream: &MockServer, api_key: Option<&str>) -> RuntimeConfig {
    let mut runtime = RuntimeConfig::default();
    runtime.openai.api_key = api_key.map(str::to_string);
    runtime.openai.base_url = upstream.uri();
    runtime.openai.retry_on = RetryOn::RateLimit;
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

/// Serve the router on an ephemeral port and return its base URL
async fn spawn_app(runtime: RuntimeConfig) -> String {
    let state = AppState::from_config(&runtime).unwrap();
    let app = build_router(state, runtime.server.max_upload_bytes);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn audio_form() -> Form {
    Form::new().part(
        "audio",
        Part::bytes(b"ID3-fake-audio".to_vec())
            .file_name("clip.mp3")
            .mime_str("audio/mpeg")
            .unwrap(),
    )
}

async fn mock_status(upstream: &MockServer, http_method: &str, route: &str, status: u16) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status).set_body_json(json!({ "error": { "message": "nope" } })),
        )
        .mount(upstream)
        .await;
}

async fn upstream_requests(upstream: &MockServer) -> usize {
    upstream.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

#[tokio::test]
async fn test_health() {
    let upstream = MockServer::start().await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-test"))).await;

    let response = reqwest::Client::new()
        .get(format!("{}/api/health", base))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "status": "OK", "message": "AI Content Creator API is running" }));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let upstream = MockServer::start().await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-test"))).await;

    let response = reqwest::get(format!("{}/api/nope", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Not found" }));
}

fn allows(value: &reqwest::header::HeaderValue, item: &str) -> bool {
    let value = value.to_str().unwrap().to_ascii_lowercase();
    value == "*" || value.split(',').any(|part| part.trim() == item)
}

#[tokio::test]
async fn test_preflight_allows_requested_headers() {
    let upstream = MockServer::start().await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-test"))).await;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{}/api/transcribe", base))
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "x-requested-with, content-type")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(allows(&headers["access-control-allow-methods"], "post"));
    assert!(allows(&headers["access-control-allow-headers"], "x-requested-with"));
    assert!(allows(&headers["access-control-allow-headers"], "content-type"));
    assert_eq!(upstream_requests(&upstream).await, 0);
}

#[tokio::test]
async fn test_transcribe_proxies_upstream_text() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "hello there" })))
        .mount(&upstream)
        .await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-test"))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/transcribe", base))
        .multipart(audio_form())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "text": "hello there" }));

    let requests = upstream.received_requests().await.unwrap();
    let forwarded = String::from_utf8_lossy(&requests[0].body);
    assert!(forwarded.contains("filename=\"clip.mp3\""));
    assert!(forwarded.contains("ID3-fake-audio"));
}

#[tokio::test]
async fn test_transcribe_without_audio_field() {
    let upstream = MockServer::start().await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-test"))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/transcribe", base))
        .multipart(Form::new().text("note", "no file here"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No audio file provided");
    assert_eq!(upstream_requests(&upstream).await, 0);
}

#[tokio::test]
async fn test_transcribe_without_multipart_body() {
    let upstream = MockServer::start().await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-test"))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/transcribe", base))
        .body("plain")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No audio file provided");
}

#[tokio::test]
async fn test_transcribe_rate_limited_after_retries() {
    let upstream = MockServer::start().await;
    mock_status(&upstream, "POST", "/audio/transcriptions", 429).await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-test"))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/transcribe", base))
        .multipart(audio_form())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Rate limit exceeded. Please wait a moment and try again."
    );
    assert_eq!(
        body["details"],
        "OpenAI API rate limit reached. Consider upgrading your plan for higher limits."
    );
    assert_eq!(upstream_requests(&upstream).await, 3);
}

#[tokio::test]
async fn test_transcribe_passes_through_upstream_status() {
    let upstream = MockServer::start().await;
    mock_status(&upstream, "POST", "/audio/transcriptions", 401).await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-bad"))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/transcribe", base))
        .multipart(audio_form())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Transcription failed: Unauthorized");
    assert!(body["details"].as_str().unwrap().contains("nope"));
    assert_eq!(upstream_requests(&upstream).await, 1);
}

#[tokio::test]
async fn test_upload_over_limit_rejected() {
    let upstream = MockServer::start().await;
    let mut runtime = runtime_for(&upstream, Some("sk-test"));
    runtime.server.max_upload_bytes = 1024;
    let base = spawn_app(runtime).await;

    let form = Form::new().part(
        "audio",
        Part::bytes(vec![0u8; 8 * 1024])
            .file_name("big.wav")
            .mime_str("audio/wav")
            .unwrap(),
    );
    let response = reqwest::Client::new()
        .post(format!("{}/api/transcribe", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(upstream_requests(&upstream).await, 0);
}

#[tokio::test]
async fn test_generate_content() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Summary." } }]
        })))
        .mount(&upstream)
        .await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-test"))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/generate-content", base))
        .json(&json!({ "transcription": "A long meeting." }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "content": "Summary." }));
}

#[tokio::test]
async fn test_generate_content_requires_transcription() {
    let upstream = MockServer::start().await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-test"))).await;
    let client = reqwest::Client::new();

    for payload in [json!({}), json!({ "transcription": "   " })] {
        let response = client
            .post(format!("{}/api/generate-content", base))
            .json(&payload)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "No transcription provided");
    }
    assert_eq!(upstream_requests(&upstream).await, 0);
}

#[tokio::test]
async fn test_openai_check_reports_model_count() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "whisper-1" }, { "id": "gpt-3.5-turbo" }]
        })))
        .mount(&upstream)
        .await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-test"))).await;

    let body: Value = reqwest::get(format!("{}/api/test-openai", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        body,
        json!({ "status": "OpenAI API Key Working", "modelsCount": 2, "keyStatus": "Valid" })
    );
}

#[tokio::test]
async fn test_openai_check_upstream_rejection() {
    let upstream = MockServer::start().await;
    mock_status(&upstream, "GET", "/models", 401).await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-bad"))).await;

    let response = reqwest::get(format!("{}/api/test-openai", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "OpenAI API Error: Unauthorized");
    assert_eq!(body["keyStatus"], "Present");
}

#[tokio::test]
async fn test_whisper_check() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "" })))
        .mount(&upstream)
        .await;
    let base = spawn_app(runtime_for(&upstream, Some("sk-test"))).await;

    let body: Value = reqwest::get(format!("{}/api/test-whisper", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        body,
        json!({ "status": "Whisper API Working", "transcription": "", "whisperStatus": "Valid" })
    );
}

#[tokio::test]
async fn test_missing_key_keeps_health_and_fails_openai_routes() {
    let upstream = MockServer::start().await;
    let base = spawn_app(runtime_for(&upstream, None)).await;
    let client = reqwest::Client::new();

    let health = client.get(format!("{}/api/health", base)).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let response = client
        .post(format!("{}/api/generate-content", base))
        .json(&json!({ "transcription": "text" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "OpenAI API key is not configured");

    let body: Value = client
        .get(format!("{}/api/test-openai", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["keyStatus"], "Missing");
    assert_eq!(upstream_requests(&upstream).await, 0);
}

#[tokio::test]
async fn test_checks_time_out_at_deadline_after_rate_limit() {
    let upstream = MockServer::start().await;
    mock_status(&upstream, "GET", "/models", 429).await;
    mock_status(&upstream, "POST", "/audio/transcriptions", 429).await;

    let mut runtime = runtime_for(&upstream, Some("sk-test"));
    runtime.network.request_deadline_secs = Some(1);
    for policy in runtime.retry_policies.operations.values_mut() {
        policy.initial_delay_ms = 30_000;
    }
    runtime.retry_policies.default.initial_delay_ms = 30_000;
    let base = spawn_app(runtime).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/test-openai", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["keyStatus"], "Present but Error");
    assert!(body["details"].as_str().unwrap().contains("deadline"));

    let response = client
        .get(format!("{}/api/test-whisper", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["whisperStatus"], "Error");

    // One rejected attempt per check, then the backoff was cut short
    assert_eq!(upstream_requests(&upstream).await, 2);
}
