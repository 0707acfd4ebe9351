//! HTTP proxy in front of the OpenAI client
//!
//! Routes:
//! - `GET  /api/health`
//! - `POST /api/transcribe` (multipart, field `audio`)
//! - `POST /api/generate-content` (`{ "transcription": ... }`)
//! - `GET  /api/test-openai`, `GET /api/test-whisper` (diagnostics)

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use scribe_core::RuntimeConfig;
use scribe_openai::{OpenAiClient, OpenAiError};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

mod content;
mod diagnostics;
mod errors;
mod health;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured; the server still answers health checks
    openai: Option<Arc<OpenAiClient>>,
}

impl AppState {
    pub fn from_config(runtime: &RuntimeConfig) -> Result<Self> {
        let openai = match OpenAiClient::new(runtime) {
            Ok(client) => Some(Arc::new(client)),
            Err(OpenAiError::MissingApiKey) => {
                warn!("OPENAI_API_KEY is not set; OpenAI routes will fail until it is configured");
                None
            }
            Err(err) => return Err(err).context("Failed to create OpenAI client"),
        };
        Ok(Self { openai })
    }

    fn client(&self) -> std::result::Result<Arc<OpenAiClient>, Response> {
        self.openai.clone().ok_or_else(errors::missing_key_response)
    }

    fn key_status(&self) -> &'static str {
        if self.openai.is_some() {
            "present"
        } else {
            "missing"
        }
    }
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route(
            "/api/transcribe",
            post(content::transcribe).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/generate-content", post(content::generate_content))
        .route("/api/test-openai", get(diagnostics::test_openai))
        .route("/api/test-whisper", get(diagnostics::test_whisper))
        .fallback(not_found)
        .layer(cors_layer())
        .with_state(state)
}

/// Bind and serve until ctrl-c
pub async fn serve(runtime: &RuntimeConfig) -> Result<()> {
    let state = AppState::from_config(runtime)?;
    let app = build_router(state, runtime.server.max_upload_bytes);

    let addr = format!("{}:{}", runtime.server.host, runtime.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let local = listener.local_addr()?;

    info!("Server running on port {}", local.port());
    info!("Health check: http://localhost:{}/api/health", local.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", err);
        std::future::pending::<()>().await;
    }
}

async fn not_found() -> Response {
    errors::not_found_response()
}

/// Permissive CORS; preflight requests are answered before routing
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
