//! Service endpoints: availability, client metrics intake, health

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::AppState;
use crate::models::ServiceStatus;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/config", get(service_config))
        .route("/metrics", post(metrics))
        .route("/health", get(health))
}

/// GET /config - Whether generation is available.
/// Never says which setting is missing.
async fn service_config(State(state): State<Arc<AppState>>) -> Response {
    if state.gateway.is_some() {
        Json(ServiceStatus {
            available: true,
            message: None,
        })
        .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ServiceStatus {
                available: false,
                message: Some("Service temporarily unavailable".into()),
            }),
        )
            .into_response()
    }
}

/// POST /metrics - Accept a client metrics batch
async fn metrics(body: Bytes) -> Response {
    match serde_json::from_slice::<Value>(&body) {
        Ok(batch) => {
            tracing::debug!(metrics = %batch, "client metrics received");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(_) => (StatusCode::BAD_REQUEST, Json(json!({ "success": false }))).into_response(),
    }
}

/// GET /health - Liveness probe
async fn health() -> &'static str {
    "ok"
}
