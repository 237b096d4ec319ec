//! Error handling for route handlers: the API error type and its wire mapping

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::constants::PROVIDER_RATE_LIMIT_WAIT_SECS;
use crate::models::{ErrorBody, FieldError};
use crate::services::gateway::GatewayError;

/// Every failure a handler can surface. `Display` is for logs; the client
/// only ever sees `public_message()`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("invalid input ({} field errors)", .0.len())]
    InvalidInput(Vec<FieldError>),

    #[error("prompt injection detected")]
    PromptInjection,

    #[error("disallowed content detected")]
    ContentFlagged,

    #[error("rate limited, retry in {retry_after_secs}s")]
    RateLimited {
        retry_after_secs: u64,
        /// Window reset as ms since epoch, when the local limiter knows it
        reset_at_ms: Option<i64>,
    },

    #[error("upstream error: {0}")]
    UpstreamTransient(String),

    #[error("upstream timeout")]
    UpstreamTimeout,

    #[error("invalid model output: {0}")]
    InvalidModelOutput(String),

    #[error("provider configuration error: {0}")]
    ApiConfig(String),

    #[error("service unavailable")]
    ServiceUnavailable,

    #[error("export format {0} unavailable")]
    ExportUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_)
            | ApiError::InvalidInput(_)
            | ApiError::PromptInjection
            | ApiError::ContentFlagged => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::UpstreamTransient(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InvalidModelOutput(_) | ApiError::ApiConfig(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ExportUnavailable(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::PromptInjection => "PROMPT_INJECTION",
            ApiError::ContentFlagged => "CONTENT_FLAGGED",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::UpstreamTransient(_) => "UPSTREAM_ERROR",
            ApiError::UpstreamTimeout => "TIMEOUT",
            ApiError::InvalidModelOutput(_) => "GENERATION_FAILED",
            ApiError::ApiConfig(_) => "API_CONFIG_ERROR",
            ApiError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ApiError::ExportUnavailable(_) => "EXPORT_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            ApiError::InvalidJson(_) => "Invalid JSON in request body".into(),
            ApiError::InvalidInput(details) => match details.first() {
                Some(first) if details.len() == 1 => format!("Invalid input: {}", first.message),
                _ => "Invalid input. Please check the highlighted fields.".into(),
            },
            ApiError::PromptInjection => {
                "Your request contains instructions that cannot be processed. Please rephrase it."
                    .into()
            }
            ApiError::ContentFlagged => {
                "Your request contains content that is not allowed. Please revise it.".into()
            }
            ApiError::RateLimited {
                retry_after_secs, ..
            } => format!("Rate limit exceeded. Please try again in {retry_after_secs} seconds."),
            ApiError::UpstreamTransient(_) => {
                "The AI service is temporarily unavailable. Please try again.".into()
            }
            ApiError::UpstreamTimeout => "The AI service took too long to respond.".into(),
            ApiError::InvalidModelOutput(_) => "Failed to generate script. Please try again.".into(),
            ApiError::ApiConfig(_) => "API configuration error. Please contact support.".into(),
            ApiError::ServiceUnavailable => "Service temporarily unavailable".into(),
            ApiError::ExportUnavailable(format) => {
                format!("Export to {format} is not available right now.")
            }
            ApiError::Internal(_) => "Something went wrong. Please try again.".into(),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Auth => ApiError::ApiConfig(err.to_string()),
            GatewayError::Quota { retry_after_secs } => ApiError::RateLimited {
                retry_after_secs: retry_after_secs.unwrap_or(PROVIDER_RATE_LIMIT_WAIT_SECS),
                reset_at_ms: None,
            },
            GatewayError::Upstream { .. } | GatewayError::Http(_) => {
                ApiError::UpstreamTransient(err.to_string())
            }
            GatewayError::Timeout => ApiError::UpstreamTimeout,
            GatewayError::Rejected { .. } | GatewayError::EmptyCompletion => {
                ApiError::InvalidModelOutput(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }

        let rate_headers = match &self {
            ApiError::RateLimited {
                retry_after_secs,
                reset_at_ms,
            } => Some((*retry_after_secs, *reset_at_ms)),
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            error: self.public_message(),
            code: self.code().to_string(),
            details: match self {
                ApiError::InvalidInput(details) => details,
                _ => Vec::new(),
            },
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        };

        let mut response = (status, Json(body)).into_response();
        if let Some((retry_after, reset_at)) = rate_headers {
            let headers = response.headers_mut();
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
            if let Some(reset_at) = reset_at {
                headers.insert("x-ratelimit-reset", HeaderValue::from(reset_at));
            }
        }
        response
    }
}

/// Extension trait for logging errors and converting them to an `ApiError`
pub trait LogErr<T> {
    /// Log error with context and return `ApiError::Internal`
    fn log_500(self, context: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> LogErr<T> for Result<T, E> {
    fn log_500(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!("{}: {}", context, e);
            ApiError::Internal(context.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_its_status_and_code() {
        let cases = [
            (ApiError::InvalidJson("x".into()), 400, "INVALID_JSON"),
            (ApiError::InvalidInput(vec![]), 400, "INVALID_INPUT"),
            (ApiError::PromptInjection, 400, "PROMPT_INJECTION"),
            (ApiError::ContentFlagged, 400, "CONTENT_FLAGGED"),
            (
                ApiError::RateLimited {
                    retry_after_secs: 5,
                    reset_at_ms: None,
                },
                429,
                "RATE_LIMITED",
            ),
            (ApiError::UpstreamTransient("x".into()), 502, "UPSTREAM_ERROR"),
            (ApiError::UpstreamTimeout, 504, "TIMEOUT"),
            (ApiError::InvalidModelOutput("x".into()), 500, "GENERATION_FAILED"),
            (ApiError::ApiConfig("x".into()), 500, "API_CONFIG_ERROR"),
            (ApiError::ServiceUnavailable, 503, "SERVICE_UNAVAILABLE"),
            (ApiError::ExportUnavailable("pdf".into()), 501, "EXPORT_UNAVAILABLE"),
            (ApiError::Internal("x".into()), 500, "INTERNAL_ERROR"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status().as_u16(), status, "{code}");
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn provider_quota_maps_to_thirty_second_wait() {
        let err = ApiError::from(GatewayError::Quota {
            retry_after_secs: None,
        });
        assert!(matches!(
            err,
            ApiError::RateLimited {
                retry_after_secs: 30,
                ..
            }
        ));
    }

    #[test]
    fn raw_provider_text_stays_out_of_the_message() {
        let err = ApiError::from(GatewayError::Upstream {
            status: 503,
            body: "secret upstream detail".into(),
        });
        assert!(!err.public_message().contains("secret"));
        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn rate_limited_response_carries_retry_headers() {
        let response = ApiError::RateLimited {
            retry_after_secs: 12,
            reset_at_ms: Some(1_700_000_000_000),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "12");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
        assert_eq!(response.headers()["x-ratelimit-reset"], "1700000000000");
    }
}
