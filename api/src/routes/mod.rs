pub mod export;
pub mod extract;
pub mod generate;
pub mod quick_edit;
pub mod service;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(generate::routes())
        .merge(quick_edit::routes())
        .merge(export::routes())
        .merge(service::routes())
}

#[cfg(test)]
mod tests;
