//! Hosted language-model access.
//!
//! The gateway sends one chat completion and reports failures as typed
//! errors. It never retries: content-quality retries belong to the
//! generation pipeline and transport retries to the client.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{TEMPERATURE, TOP_P};

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("provider rejected the API key")]
    Auth,

    #[error("provider quota or rate limit reached")]
    Quota { retry_after_secs: Option<u64> },

    #[error("provider returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("provider rejected the request with {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("provider call timed out")]
    Timeout,

    #[error("provider returned no completion text")]
    EmptyCompletion,

    #[error("http error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Http(value.to_string())
        }
    }
}

#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError>;
}

// ============================================================================
// OpenRouter
// ============================================================================

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub site_url: String,
    pub app_title: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client pointed at OpenRouter
#[derive(Debug, Clone)]
pub struct OpenRouterGateway {
    config: OpenRouterConfig,
    http: reqwest::Client,
}

impl OpenRouterGateway {
    pub fn new(config: OpenRouterConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            config: OpenRouterConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            http,
        })
    }
}

/// Map a non-success provider status onto the gateway taxonomy
pub fn classify_status(status: StatusCode, retry_after: Option<u64>, body: String) -> GatewayError {
    let lowered = body.to_lowercase();
    match status.as_u16() {
        401 | 403 => GatewayError::Auth,
        402 | 429 => GatewayError::Quota {
            retry_after_secs: retry_after,
        },
        408 | 504 => GatewayError::Timeout,
        s if s >= 500 => GatewayError::Upstream { status: s, body },
        s if lowered.contains("quota") || lowered.contains("rate limit") => {
            tracing::debug!(status = s, "provider reported quota in a client error");
            GatewayError::Quota {
                retry_after_secs: retry_after,
            }
        }
        s => GatewayError::Rejected { status: s, body },
    }
}

#[async_trait]
impl ModelGateway for OpenRouterGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_tokens: request.max_tokens,
        };

        let started = std::time::Instant::now();
        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .header("HTTP-Referer", &self.config.site_url)
            .header("X-Title", &self.config.app_title)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, model = %self.config.model, "provider call failed");
            return Err(classify_status(status, retry_after, body));
        }

        let parsed: ChatResponse = response.json().await?;
        tracing::debug!(
            model = %self.config.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "provider call complete"
        );

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(GatewayError::EmptyCompletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_statuses_are_classified() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, None, String::new()),
            GatewayError::Auth
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, Some(12), String::new()),
            GatewayError::Quota {
                retry_after_secs: Some(12)
            }
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, None, "down".into()),
            GatewayError::Upstream { status: 502, .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, None, "Quota exceeded".into()),
            GatewayError::Quota { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, None, "context too long".into()),
            GatewayError::Rejected { status: 400, .. }
        ));
    }

    #[test]
    fn request_body_uses_fixed_sampling() {
        let body = ChatRequest {
            model: "deepseek/deepseek-chat",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "s",
                },
                ChatMessage {
                    role: "user",
                    content: "u",
                },
            ],
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_tokens: 2000,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 2000);
        assert!((json["temperature"].as_f64().unwrap_or_default() - 0.8).abs() < 1e-6);
    }
}
