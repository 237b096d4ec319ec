use serde::{Deserialize, Serialize};

use super::GeneratedScript;

closed_enum! {
    /// Export target. `srt` is rendered in-process, the rest by a converter.
    pub enum ExportFormat {
        Pdf => "pdf",
        Docx => "docx",
        Pptx => "pptx",
        Srt => "srt",
    }
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            ExportFormat::Srt => "application/x-subrip",
        }
    }
}

/// `POST /quick-edit` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickEditRequest {
    pub script: GeneratedScript,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

/// `POST /export` body. The format stays a string so a bad value is an
/// input error rather than a JSON error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    pub script: GeneratedScript,
    pub format: String,
}

/// `GET /config` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
