//! Transport-level retry with exponential backoff, jitter and `Retry-After`.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;

use crate::error::{ClientError, RETRYABLE_STATUSES};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Wait assumed when a 429 arrives without a usable `Retry-After`
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound of the uniform jitter added to each delay
    pub max_jitter: Duration,
    /// A 429 asking for longer than this is surfaced instead of waited out
    pub max_retry_after: Duration,
    /// Per-attempt budget; an attempt over budget is dropped
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
            max_retry_after: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn short_form() -> Self {
        Self {
            timeout: Duration::from_secs(45),
            ..Self::default()
        }
    }

    pub fn long_form() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            ..Self::default()
        }
    }

    /// `base × 2^attempt` plus jitter, `attempt` counted from zero
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..jitter_ms)
        };
        exponential + Duration::from_millis(jitter)
    }
}

/// Parse a `Retry-After` value: delay seconds or an HTTP-date. Dates in the
/// past give zero.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    let wait = (at - now).num_milliseconds().max(0) as u64;
    Some(Duration::from_millis(wait))
}

/// Server-requested wait on a 429, defaulting when absent or unreadable
pub fn rate_limit_wait(response: &HttpResponse) -> Duration {
    response
        .header("retry-after")
        .and_then(|v| parse_retry_after(v, Utc::now()))
        .unwrap_or(DEFAULT_RATE_LIMIT_WAIT)
}

/// Send `request`, retrying retryable statuses and network failures.
///
/// Returns the final response whatever its status once retrying stops; only
/// network-level failures come back as errors. `on_retry` sees the upcoming
/// attempt number, the failure and the delay before it is slept.
pub async fn fetch_with_retry<F>(
    transport: &dyn Transport,
    request: &HttpRequest,
    policy: &RetryPolicy,
    mut on_retry: F,
) -> Result<HttpResponse, ClientError>
where
    F: FnMut(u32, &ClientError, Duration) + Send,
{
    let mut attempt = 0;
    loop {
        let outcome = match tokio::time::timeout(policy.timeout, transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        };

        let (failure, delay) = match outcome {
            Ok(response) if !RETRYABLE_STATUSES.contains(&response.status) => return Ok(response),
            Ok(response) => {
                let backoff = policy.backoff(attempt);
                let delay = if response.status == 429 {
                    let wait = rate_limit_wait(&response);
                    if wait > policy.max_retry_after {
                        tracing::info!(wait_secs = wait.as_secs(), "rate limited beyond retry budget");
                        return Ok(response);
                    }
                    backoff.max(wait)
                } else {
                    backoff
                };
                if attempt >= policy.max_retries {
                    return Ok(response);
                }
                let failure =
                    ClientError::from_response(response.status, &response.body, None);
                (failure, delay)
            }
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                (err, policy.backoff(attempt))
            }
            Err(err) => return Err(err),
        };

        attempt += 1;
        tracing::warn!(
            attempt,
            path = %request.path,
            error = %failure,
            delay_ms = delay.as_millis() as u64,
            "retrying request"
        );
        on_retry(attempt, &failure, delay);
        tokio::time::sleep(delay).await;
    }
}
