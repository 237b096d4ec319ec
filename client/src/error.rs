//! Client-side error taxonomy and the user-facing message table.

use scriptboost_api::models::ErrorBody;

/// Errors surfaced by the API client
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success status
    #[error("api error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        retryable: bool,
        retry_after_secs: Option<u64>,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("request cancelled")]
    Cancelled,
}

/// Statuses worth another attempt
pub const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

impl ClientError {
    /// Build from a failed response. The body is the server's error envelope
    /// when it parses; otherwise the code falls back to the status.
    pub fn from_response(status: u16, body: &[u8], retry_after_secs: Option<u64>) -> Self {
        let envelope: Option<ErrorBody> = serde_json::from_slice(body).ok();
        let code = envelope
            .as_ref()
            .map(|e| e.code.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| fallback_code(status).to_string());
        let message = envelope
            .map(|e| e.error)
            .unwrap_or_else(|| format!("request failed with status {status}"));
        ClientError::Api {
            status,
            code,
            message,
            retryable: RETRYABLE_STATUSES.contains(&status),
            retry_after_secs,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ClientError::Api { code, .. } => code,
            ClientError::Network(_) => "NETWORK_ERROR",
            ClientError::Timeout => "TIMEOUT",
            ClientError::Decode(_) => "GENERATION_FAILED",
            ClientError::Cancelled => "CANCELLED",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Api { retryable, .. } => *retryable,
            ClientError::Network(_) | ClientError::Timeout => true,
            ClientError::Decode(_) | ClientError::Cancelled => false,
        }
    }

    /// Message safe to show a user. Raw server or provider text never
    /// appears here.
    pub fn user_message(&self) -> String {
        if let ClientError::Api {
            status: 429,
            retry_after_secs,
            ..
        } = self
        {
            return match retry_after_secs {
                Some(secs) if *secs > 0 => format!("Too many requests. Try again in {secs} seconds"),
                _ => "Too many requests. Please wait a moment and try again.".into(),
            };
        }

        match self.code() {
            "RATE_LIMITED" => "Too many requests. Please wait a moment before trying again.",
            "INVALID_INPUT" | "INVALID_JSON" => "Please check your input and try again.",
            "PROMPT_INJECTION" => {
                "Your request contains instructions that cannot be processed. Please rephrase it."
            }
            "CONTENT_FLAGGED" => "Your request contains content that is not allowed. Please revise it.",
            "NETWORK_ERROR" => "Connection failed. Please check your internet and try again.",
            "GENERATION_FAILED" => "Failed to generate script. Please try again with different inputs.",
            "TIMEOUT" => "Request timed out. Please try again.",
            "API_CONFIG_ERROR" => "API configuration error. Please contact support.",
            "SERVICE_UNAVAILABLE" => "The service is temporarily unavailable. Please try again later.",
            "UPSTREAM_ERROR" => "The AI service is having trouble right now. Please try again.",
            "EXPORT_UNAVAILABLE" => "That export format is not available right now.",
            "CANCELLED" => "Generation cancelled.",
            _ => "An unexpected error occurred. Please try again.",
        }
        .to_string()
    }
}

fn fallback_code(status: u16) -> &'static str {
    match status {
        400 => "INVALID_INPUT",
        429 => "RATE_LIMITED",
        501 => "EXPORT_UNAVAILABLE",
        502 => "UPSTREAM_ERROR",
        503 => "SERVICE_UNAVAILABLE",
        504 => "TIMEOUT",
        _ => "INTERNAL_ERROR",
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Network(value.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        ClientError::Decode(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_code_is_used() {
        let body = br#"{"success":false,"error":"upstream said: quota for key sk-123","code":"UPSTREAM_ERROR"}"#;
        let err = ClientError::from_response(502, body, None);
        assert_eq!(err.code(), "UPSTREAM_ERROR");
        assert!(err.is_retryable());
        assert!(!err.user_message().contains("sk-123"));
    }

    #[test]
    fn unparseable_body_falls_back_to_status() {
        let err = ClientError::from_response(503, b"<html>bad gateway</html>", None);
        assert_eq!(err.code(), "SERVICE_UNAVAILABLE");
        let err = ClientError::from_response(404, b"", None);
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(!err.is_retryable());
    }

    #[test]
    fn rate_limit_message_counts_down() {
        let err = ClientError::from_response(429, b"{}", Some(12));
        assert_eq!(err.user_message(), "Too many requests. Try again in 12 seconds");
        let err = ClientError::from_response(429, b"{}", None);
        assert_eq!(
            err.user_message(),
            "Too many requests. Please wait a moment and try again."
        );
    }

    #[test]
    fn unknown_code_gets_generic_message() {
        let err = ClientError::Api {
            status: 500,
            code: "SOMETHING_NEW".into(),
            message: "stack trace here".into(),
            retryable: true,
            retry_after_secs: None,
        };
        assert_eq!(err.user_message(), "An unexpected error occurred. Please try again.");
        assert_eq!(ClientError::Timeout.user_message(), "Request timed out. Please try again.");
    }
}
