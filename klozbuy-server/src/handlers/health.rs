use crate::metrics;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "klozbuy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus text exposition.
pub async fn prometheus() -> impl IntoResponse {
    match metrics::render() {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "metrics recorder not installed".to_string(),
        ),
    }
}
