//! Binary document rendering delegated to an external converter service.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::time::Duration;

use crate::domain::export::ExportDocument;
use crate::models::ExportFormat;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("converter does not support {0}")]
    Unsupported(ExportFormat),

    #[error("converter returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(
        &self,
        format: ExportFormat,
        document: &ExportDocument,
    ) -> Result<Bytes, ConvertError>;
}

#[derive(Serialize)]
struct ConvertRequest<'a> {
    format: ExportFormat,
    document: &'a ExportDocument,
}

/// Posts `{format, document}` as JSON and returns the response body as the file
#[derive(Debug, Clone)]
pub struct HttpConverter {
    url: String,
    http: reqwest::Client,
}

impl HttpConverter {
    pub fn new(url: impl Into<String>) -> Result<Self, ConvertError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl DocumentConverter for HttpConverter {
    async fn convert(
        &self,
        format: ExportFormat,
        document: &ExportDocument,
    ) -> Result<Bytes, ConvertError> {
        if format == ExportFormat::Srt {
            return Err(ConvertError::Unsupported(format));
        }

        let response = self
            .http
            .post(&self.url)
            .json(&ConvertRequest { format, document })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConvertError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        tracing::debug!(format = %format, size = bytes.len(), "document converted");
        Ok(bytes)
    }
}
