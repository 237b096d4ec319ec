use std::sync::Arc;

use scriptboost_api::config::Config;
use scriptboost_api::constants::SWEEP_INTERVAL;
use scriptboost_api::{AppState, build_app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let port = config.port;
    let state = Arc::new(AppState::from_config(config));

    // Expired limiter windows and cache entries
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let windows = sweeper.limiter.cleanup();
            let entries = sweeper.cache.sweep();
            tracing::debug!(windows, entries, "swept expired state");
        }
    });

    let app = build_app(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind");
            return;
        }
    };

    tracing::info!("Listening on http://{}", addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server failed");
    }
}
