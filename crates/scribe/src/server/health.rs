use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "AI Content Creator API is running",
    })
}
