//! Application constants

use std::time::Duration;

/// Hook slot length in seconds
pub const HOOK_SECONDS: u32 = 3;

/// CTA slot length in seconds. Fixed by contract, never model-supplied.
pub const CTA_SECONDS: u32 = 3;

/// Placeholder substituted for a required text field the model left blank
pub const TEXT_PLACEHOLDER: &str = "...";

/// Niche bounds (chars / words)
pub const NICHE_MAX_CHARS: usize = 200;
pub const NICHE_MAX_WORDS: usize = 100;

/// Short-form additional context bounds (chars / words)
pub const CONTEXT_MAX_CHARS: usize = 500;
pub const CONTEXT_MAX_WORDS: usize = 500;

/// Long-form additional context bounds (chars / words)
pub const LONG_CONTEXT_MAX_CHARS: usize = 1000;
pub const LONG_CONTEXT_MAX_WORDS: usize = 500;

/// Sampling parameters shared by every completion call
pub const TEMPERATURE: f32 = 0.8;
pub const TOP_P: f32 = 0.9;

/// Completion token budgets
pub const SHORT_FORM_MAX_TOKENS: u32 = 2000;
pub const LONG_FORM_MAX_TOKENS: u32 = 4000;
pub const QUICK_EDIT_MAX_TOKENS: u32 = 1500;

/// Provider call timeouts, kept under the client's own 45s / 60s budgets
pub const SHORT_FORM_MODEL_TIMEOUT: Duration = Duration::from_secs(40);
pub const LONG_FORM_MODEL_TIMEOUT: Duration = Duration::from_secs(55);

/// Fixed-window rate limit defaults
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 10;
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// How often expired limiter windows and cache entries are swept
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Wait suggested when the provider itself reports a quota / rate problem
pub const PROVIDER_RATE_LIMIT_WAIT_SECS: u64 = 30;

/// Server response cache lifetimes
pub const SHORT_FORM_CACHE_TTL: Duration = Duration::from_secs(60);
pub const LONG_FORM_CACHE_TTL: Duration = Duration::from_secs(120);

/// Request body cap for all JSON endpoints (256 KB)
pub const MAX_REQUEST_BODY: usize = 256 * 1024;

/// Long-form narration pace
pub const WORDS_PER_MINUTE: u32 = 150;

/// Share of a long-form video spent on intro / outro
pub const INTRO_SHARE: f64 = 0.08;
pub const OUTRO_SHARE: f64 = 0.07;
