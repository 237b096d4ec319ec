//! Request extractors shared by the route modules

use axum::{
    extract::{FromRequest, FromRequestParts, rejection::JsonRejection},
    http::request::Parts,
};

use crate::services::error::ApiError;

// ============================================================================
// Client identity
// ============================================================================

/// Rate-limit identity: first `X-Forwarded-For` entry, else `X-Real-IP`,
/// else `"unknown"`. Never rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientId {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let forwarded = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let id = forwarded
            .or_else(|| header("x-real-ip"))
            .unwrap_or("unknown")
            .to_string();
        Ok(ClientId(id))
    }
}

/// Optional `Idempotency-Key` header
#[derive(Debug, Clone, Default)]
pub struct IdempotencyKey(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for IdempotencyKey {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get("idempotency-key")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().chars().take(128).collect::<String>())
            .filter(|v| !v.is_empty());
        Ok(IdempotencyKey(key))
    }
}

// ============================================================================
// JSON bodies
// ============================================================================

/// `Json` whose rejection is the API's `INVALID_JSON` error
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidJson(rejection.body_text())
    }
}
