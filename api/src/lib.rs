//! ScriptBoost generation server.
//!
//! Turns a short creative brief into a platform-tuned video script by way of
//! an OpenRouter-hosted model, with validation, abuse screening, rate limiting
//! and normalization on either side of the model call.

pub mod config;
pub mod constants;
pub mod domain;
pub mod models;
pub mod routes;
pub mod services;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use config::{APP_TITLE, Config};
use constants::MAX_REQUEST_BODY;
use services::cache::{MemoryResponseCache, ResponseCache};
use services::converter::{DocumentConverter, HttpConverter};
use services::gateway::{ModelGateway, OpenRouterConfig, OpenRouterGateway};
use services::rate_limit::{FixedWindowLimiter, RateLimitConfig};

pub struct AppState {
    pub config: Config,
    /// `None` when no provider key is configured
    pub gateway: Option<Arc<dyn ModelGateway>>,
    pub limiter: FixedWindowLimiter,
    pub cache: Arc<dyn ResponseCache>,
    /// `None` when binary exports are not configured
    pub converter: Option<Arc<dyn DocumentConverter>>,
}

impl AppState {
    /// Wire the real gateway and converter from configuration. A component
    /// that cannot be built is logged and left out rather than aborting.
    pub fn from_config(config: Config) -> Self {
        let gateway = config.openrouter_api_key.as_ref().and_then(|api_key| {
            let gateway = OpenRouterGateway::new(OpenRouterConfig {
                base_url: config.openrouter_base_url.clone(),
                api_key: api_key.clone(),
                model: config.model.clone(),
                site_url: config.site_url.clone(),
                app_title: APP_TITLE.to_string(),
            });
            match gateway {
                Ok(gateway) => Some(Arc::new(gateway) as Arc<dyn ModelGateway>),
                Err(e) => {
                    tracing::error!(error = %e, "failed to build model gateway");
                    None
                }
            }
        });

        let converter = config
            .export_converter_url
            .as_ref()
            .and_then(|url| match HttpConverter::new(url.clone()) {
                Ok(converter) => Some(Arc::new(converter) as Arc<dyn DocumentConverter>),
                Err(e) => {
                    tracing::error!(error = %e, "failed to build export converter");
                    None
                }
            });

        Self::with_parts(config, gateway, converter)
    }

    pub fn with_parts(
        config: Config,
        gateway: Option<Arc<dyn ModelGateway>>,
        converter: Option<Arc<dyn DocumentConverter>>,
    ) -> Self {
        let limiter = FixedWindowLimiter::new(RateLimitConfig {
            max_requests: config.rate_limit_max,
            window: config.rate_limit_window,
        });
        Self {
            config,
            gateway,
            limiter,
            cache: Arc::new(MemoryResponseCache::new()),
            converter,
        }
    }
}

/// Full application router with body limit, CORS and security headers
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = match state
        .config
        .allowed_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => CorsLayer::new().allow_origin(AllowOrigin::exact(origin)),
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods(Any)
    .allow_headers(Any);

    routes::build_routes()
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY))
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .with_state(state)
}
