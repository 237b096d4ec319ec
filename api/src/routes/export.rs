//! Export endpoint (/export)

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::post,
};
use bytes::Bytes;
use std::sync::Arc;

use super::extract::ApiJson;
use crate::AppState;
use crate::domain::export::{build_document, export_filename, to_srt};
use crate::models::{ExportFormat, ExportRequest, FieldError};
use crate::services::converter::ConvertError;
use crate::services::error::{ApiError, LogErr};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/export", post(export))
}

/// POST /export - Download a script as pdf, docx, pptx or srt
async fn export(
    State(state): State<Arc<AppState>>,
    body: Result<ApiJson<ExportRequest>, ApiError>,
) -> Result<Response, ApiError> {
    let ApiJson(request) = body?;
    let format = ExportFormat::parse(&request.format).ok_or_else(|| {
        ApiError::InvalidInput(vec![FieldError::new(
            "format",
            "format must be one of pdf, docx, pptx, srt",
        )])
    })?;

    let script = &request.script;
    let file: Bytes = match format {
        ExportFormat::Srt => Bytes::from(to_srt(script)),
        _ => {
            let converter = state
                .converter
                .as_ref()
                .ok_or_else(|| ApiError::ExportUnavailable(format.to_string()))?;
            match converter.convert(format, &build_document(script)).await {
                Err(ConvertError::Unsupported(format)) => {
                    return Err(ApiError::ExportUnavailable(format.to_string()));
                }
                converted => converted.log_500("document conversion failed")?,
            }
        }
    };

    let filename = export_filename(script, format);
    tracing::info!(script_id = %script.id, format = %format, bytes = file.len(), "export rendered");

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .log_500("invalid export filename")?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(format.content_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file,
    )
        .into_response())
}
