//! Quick edit endpoint (/quick-edit)

use axum::{Router, extract::State, response::Response, routing::post};
use std::sync::Arc;

use super::extract::{ApiJson, ClientId};
use super::generate::{admit, gateway, respond};
use crate::AppState;
use crate::domain::quick_edit::EditAction;
use crate::models::QuickEditRequest;
use crate::services::error::ApiError;
use crate::services::generation;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/quick-edit", post(quick_edit))
}

/// POST /quick-edit - Apply a one-click revision to a generated script
async fn quick_edit(
    State(state): State<Arc<AppState>>,
    ClientId(client): ClientId,
    body: Result<ApiJson<QuickEditRequest>, ApiError>,
) -> Result<Response, ApiError> {
    let admission = admit(&state, &client)?;
    let ApiJson(request) = body?;
    let gateway = gateway(&state)?;

    let action = EditAction::parse(&request.action, request.tone.as_deref())
        .map_err(ApiError::InvalidInput)?;

    tracing::info!(
        client = %client,
        script_id = %request.script.id,
        action = action.as_str(),
        "applying quick edit"
    );
    let edited = generation::quick_edit(gateway, &request.script, &action).await?;
    Ok(respond(&admission, edited))
}
