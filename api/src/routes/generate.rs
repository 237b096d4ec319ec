//! Generation endpoints (/generate, /generate-long)

use axum::{
    Json, Router,
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::extract::{ApiJson, ClientId, IdempotencyKey};
use crate::AppState;
use crate::constants::{LONG_FORM_CACHE_TTL, SHORT_FORM_CACHE_TTL};
use crate::domain::validation::{validate_long_form_input, validate_script_input};
use crate::models::{
    ApiResponse, GenerateLongRequest, GenerateRequest, GeneratedScript, LongFormGenerated,
};
use crate::services::cache::cache_key;
use crate::services::error::ApiError;
use crate::services::gateway::ModelGateway;
use crate::services::generation;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate", post(generate))
        .route("/generate-long", post(generate_long))
}

// ============================================================================
// Shared plumbing
// ============================================================================

/// Rate-limit snapshot taken when the request was admitted
pub(crate) struct Admission {
    remaining: u32,
    reset_at_ms: i64,
    started: Instant,
}

/// Count the request against the client's window or reject it with 429
pub(crate) fn admit(state: &AppState, client: &str) -> Result<Admission, ApiError> {
    let started = Instant::now();
    if !state.limiter.is_allowed(client) {
        let retry_after_secs = state.limiter.retry_after_secs(client);
        tracing::warn!(client = %client, retry_after_secs, "rate limit exceeded");
        return Err(ApiError::RateLimited {
            retry_after_secs,
            reset_at_ms: Some(state.limiter.reset_time(client)),
        });
    }
    Ok(Admission {
        remaining: state.limiter.remaining(client),
        reset_at_ms: state.limiter.reset_time(client),
        started,
    })
}

pub(crate) fn gateway(state: &AppState) -> Result<&dyn ModelGateway, ApiError> {
    state
        .gateway
        .as_deref()
        .ok_or(ApiError::ServiceUnavailable)
}

/// JSON success envelope plus the rate-limit and timing headers
pub(crate) fn respond<T: Serialize>(admission: &Admission, data: T) -> Response {
    let elapsed_ms = admission.started.elapsed().as_millis() as u64;
    let mut response = Json(ApiResponse::ok(data)).into_response();
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-remaining", HeaderValue::from(admission.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(admission.reset_at_ms));
    headers.insert("x-processing-time", HeaderValue::from(elapsed_ms));
    response
}

fn cached<T: DeserializeOwned>(state: &AppState, key: &str) -> Option<T> {
    let value = state.cache.get(key)?;
    serde_json::from_value(value).ok()
}

fn remember<T: Serialize>(state: &AppState, key: &str, value: &T, ttl: Duration) {
    match serde_json::to_value(value) {
        Ok(json) => state.cache.put(key, json, ttl),
        Err(e) => tracing::warn!(error = %e, "could not cache generation result"),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /generate - Generate a short-form script
async fn generate(
    State(state): State<Arc<AppState>>,
    ClientId(client): ClientId,
    IdempotencyKey(idempotency_key): IdempotencyKey,
    body: Result<ApiJson<GenerateRequest>, ApiError>,
) -> Result<Response, ApiError> {
    let admission = admit(&state, &client)?;
    let ApiJson(request) = body?;
    let gateway = gateway(&state)?;

    let input = validate_script_input(&request.input).map_err(ApiError::InvalidInput)?;
    generation::screen_script_input(&input)?;

    let key = cache_key("short", &client, idempotency_key.as_deref(), &input);
    if let Some(script) = cached::<GeneratedScript>(&state, &key) {
        tracing::info!(client = %client, "serving cached script");
        return Ok(respond(&admission, script));
    }

    tracing::info!(
        client = %client,
        platform = %input.platform,
        length = input.script_length.seconds(),
        "generating script"
    );
    let script = generation::generate_script(gateway, &input).await?;
    remember(&state, &key, &script, SHORT_FORM_CACHE_TTL);

    tracing::info!(
        client = %client,
        elapsed_ms = admission.started.elapsed().as_millis() as u64,
        "script generated"
    );
    Ok(respond(&admission, script))
}

/// POST /generate-long - Generate a long-form outline and script
async fn generate_long(
    State(state): State<Arc<AppState>>,
    ClientId(client): ClientId,
    IdempotencyKey(idempotency_key): IdempotencyKey,
    body: Result<ApiJson<GenerateLongRequest>, ApiError>,
) -> Result<Response, ApiError> {
    let admission = admit(&state, &client)?;
    let ApiJson(request) = body?;
    let gateway = gateway(&state)?;

    let input = validate_long_form_input(&request.input).map_err(ApiError::InvalidInput)?;
    generation::screen_long_form_input(&input)?;

    let key = cache_key("long", &client, idempotency_key.as_deref(), &input);
    if let Some(generated) = cached::<LongFormGenerated>(&state, &key) {
        tracing::info!(client = %client, "serving cached long-form script");
        return Ok(respond(&admission, generated));
    }

    tracing::info!(
        client = %client,
        minutes = input.video_length_minutes.minutes(),
        chapters = input.chapter_segmentation,
        "generating long-form script"
    );
    let generated = generation::generate_long_form(gateway, &input).await?;
    remember(&state, &key, &generated, LONG_FORM_CACHE_TTL);

    tracing::info!(
        client = %client,
        elapsed_ms = admission.started.elapsed().as_millis() as u64,
        "long-form script generated"
    );
    Ok(respond(&admission, generated))
}
