//! Runtime configuration, read once from the environment at startup.

use std::time::Duration;

use crate::constants::{RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW};

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat";
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const APP_TITLE: &str = "ScriptBoost";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `None` leaves the service up but reporting unavailable
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub model: String,
    pub site_url: String,
    pub port: u16,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub export_converter_url: Option<String>,
    /// `None` allows any origin
    pub allowed_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openrouter_base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            port: 3000,
            rate_limit_max: RATE_LIMIT_MAX_REQUESTS,
            rate_limit_window: RATE_LIMIT_WINDOW,
            export_converter_url: None,
            allowed_origin: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing or malformed optional values warn and
    /// fall back to defaults; nothing here panics.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let openrouter_api_key = get("OPENROUTER_API_KEY");
        if openrouter_api_key.is_none() {
            tracing::warn!("OPENROUTER_API_KEY not set; generation endpoints will report unavailable");
        }

        let site_url = get("SITE_URL").unwrap_or_else(|| {
            tracing::warn!(default = DEFAULT_SITE_URL, "SITE_URL not set, using default");
            defaults.site_url.clone()
        });

        Self {
            openrouter_api_key,
            openrouter_base_url: get("OPENROUTER_BASE_URL").unwrap_or(defaults.openrouter_base_url),
            model: get("DEEPSEEK_MODEL").unwrap_or(defaults.model),
            site_url,
            port: parse_or("PORT", get("PORT"), defaults.port),
            rate_limit_max: parse_or("RATE_LIMIT_MAX", get("RATE_LIMIT_MAX"), defaults.rate_limit_max),
            rate_limit_window: Duration::from_secs(parse_or(
                "RATE_LIMIT_WINDOW_SECS",
                get("RATE_LIMIT_WINDOW_SECS"),
                defaults.rate_limit_window.as_secs(),
            )),
            export_converter_url: get("EXPORT_CONVERTER_URL"),
            allowed_origin: get("ALLOWED_ORIGIN"),
        }
    }
}

fn parse_or<T: std::str::FromStr + std::fmt::Display + Copy>(
    key: &str,
    raw: Option<String>,
    default: T,
) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "invalid value, using default");
            default
        }),
    }
}
