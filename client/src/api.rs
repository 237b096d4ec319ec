//! Async client for the ScriptBoost API.

use bytes::Bytes;
use chrono::Utc;
use futures::future::{AbortHandle, Abortable};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use scriptboost_api::domain::export::export_filename;
use scriptboost_api::models::{
    ApiResponse, ExportFormat, GeneratedScript, LongFormGenerated, LongFormInput, ScriptInput,
};

use crate::cache::{LONG_FORM_TTL, SHORT_FORM_TTL, TtlCache};
use crate::dedup::Dedup;
use crate::error::ClientError;
use crate::retry::{RetryPolicy, fetch_with_retry, parse_retry_after, rate_limit_wait};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

pub type RetryObserver = Arc<dyn Fn(u32, &ClientError, Duration) + Send + Sync>;

/// A downloaded export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Aborts the generation it was issued for. The server may still finish the
/// request; the client stops waiting at once.
#[derive(Debug, Clone)]
pub struct CancelHandle(AbortHandle);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.abort();
    }
}

/// Wrap `future` so a `CancelHandle` can abandon it with `ClientError::Cancelled`
pub fn cancellable<T, F>(future: F) -> (CancelHandle, impl Future<Output = Result<T, ClientError>>)
where
    F: Future<Output = Result<T, ClientError>>,
{
    let (handle, registration) = AbortHandle::new_pair();
    let abortable = Abortable::new(future, registration);
    let wrapped = async move { abortable.await.unwrap_or(Err(ClientError::Cancelled)) };
    (CancelHandle(handle), wrapped)
}

/// Client with transport retry, in-flight dedup and a short result cache
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    observer: Option<RetryObserver>,
    short_inflight: Dedup<Result<GeneratedScript, ClientError>>,
    long_inflight: Dedup<Result<LongFormGenerated, ClientError>>,
    short_cache: TtlCache<GeneratedScript>,
    long_cache: TtlCache<LongFormGenerated>,
}

impl ApiClient {
    /// Create a new client targeting the provided base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new(base_url)?)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            observer: None,
            short_inflight: Dedup::new(),
            long_inflight: Dedup::new(),
            short_cache: TtlCache::new(SHORT_FORM_TTL),
            long_cache: TtlCache::new(LONG_FORM_TTL),
        }
    }

    /// Called before every retry with the attempt, failure and delay
    pub fn with_retry_observer(mut self, observer: RetryObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// POST /generate
    pub async fn generate_script(&self, input: &ScriptInput) -> Result<GeneratedScript, ClientError> {
        let cache_key = TtlCache::<GeneratedScript>::key_for(input);
        if let Some(script) = self.short_cache.get(&cache_key) {
            tracing::debug!("using cached script");
            return Ok(script);
        }

        let request = HttpRequest::post("/generate", json!({ "input": input }));
        let call = self.call::<GeneratedScript>(request.clone(), RetryPolicy::short_form());
        let script = self.short_inflight.run(request.dedup_key(), || call).await?;
        self.short_cache.put(cache_key, script.clone());
        Ok(script)
    }

    /// POST /generate-long
    pub async fn generate_long_form(
        &self,
        input: &LongFormInput,
    ) -> Result<LongFormGenerated, ClientError> {
        let cache_key = TtlCache::<LongFormGenerated>::key_for(input);
        if let Some(generated) = self.long_cache.get(&cache_key) {
            tracing::debug!("using cached long-form script");
            return Ok(generated);
        }

        let request = HttpRequest::post("/generate-long", json!({ "input": input }));
        let call = self.call::<LongFormGenerated>(request.clone(), RetryPolicy::long_form());
        let generated = self.long_inflight.run(request.dedup_key(), || call).await?;
        self.long_cache.put(cache_key, generated.clone());
        Ok(generated)
    }

    /// POST /quick-edit
    pub async fn quick_edit(
        &self,
        script: &GeneratedScript,
        action: &str,
        tone: Option<&str>,
    ) -> Result<GeneratedScript, ClientError> {
        let mut body = json!({ "script": script, "action": action });
        if let Some(tone) = tone {
            body["tone"] = json!(tone);
        }
        self.call(HttpRequest::post("/quick-edit", body), RetryPolicy::short_form())
            .await
    }

    /// POST /export
    pub async fn export(
        &self,
        script: &GeneratedScript,
        format: ExportFormat,
    ) -> Result<ExportFile, ClientError> {
        let request = HttpRequest::post("/export", json!({ "script": script, "format": format }));
        let response = self.send(&request, RetryPolicy::default()).await?;
        if !response.is_success() {
            return Err(error_from(&response));
        }

        let filename = response
            .header("content-disposition")
            .and_then(attachment_filename)
            .unwrap_or_else(|| export_filename(script, format));
        let content_type = response
            .header("content-type")
            .unwrap_or(format.content_type())
            .to_string();
        Ok(ExportFile {
            filename,
            content_type,
            bytes: response.body,
        })
    }

    /// GET /config. A 503 means "not available", not a failure.
    pub async fn service_available(&self) -> Result<bool, ClientError> {
        let policy = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        let response = self.send(&HttpRequest::get("/config"), policy).await?;
        match response.status {
            200 => Ok(true),
            503 => Ok(false),
            _ => Err(error_from(&response)),
        }
    }

    /// POST /metrics, fire and forget
    pub fn send_metrics(&self, batch: Value) {
        let transport = self.transport.clone();
        tokio::spawn(async move {
            match transport.send(&HttpRequest::post("/metrics", batch)).await {
                Ok(response) if response.is_success() => {}
                Ok(response) => tracing::debug!(status = response.status, "metrics rejected"),
                Err(e) => tracing::debug!(error = %e, "metrics not sent"),
            }
        });
    }

    async fn send(&self, request: &HttpRequest, policy: RetryPolicy) -> Result<HttpResponse, ClientError> {
        let observer = self.observer.clone();
        fetch_with_retry(self.transport.as_ref(), request, &policy, move |attempt, err, delay| {
            if let Some(observer) = &observer {
                observer(attempt, err, delay);
            }
        })
        .await
    }

    /// One logical JSON call. Owns everything it needs so it can be shared
    /// across deduplicated callers; the idempotency key is fixed here and
    /// reused by every retry.
    fn call<T>(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> impl Future<Output = Result<T, ClientError>> + Send + 'static
    where
        T: DeserializeOwned + Send + 'static,
    {
        let transport = self.transport.clone();
        let observer = self.observer.clone();
        let request = request.header("idempotency-key", uuid::Uuid::new_v4().to_string());
        async move {
            let started = std::time::Instant::now();
            let response = fetch_with_retry(transport.as_ref(), &request, &policy, |attempt, err, delay| {
                if let Some(observer) = &observer {
                    observer(attempt, err, delay);
                }
            })
            .await?;
            tracing::debug!(
                path = %request.path,
                status = response.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "api call finished"
            );
            decode(&response)
        }
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ClientError> {
    if !response.is_success() {
        return Err(error_from(response));
    }
    let envelope: ApiResponse<T> = serde_json::from_slice(&response.body)?;
    Ok(envelope.data)
}

/// A 429 always carries a wait, defaulting when the server sent none
fn error_from(response: &HttpResponse) -> ClientError {
    let retry_after_secs = if response.status == 429 {
        Some(rate_limit_wait(response).as_secs())
    } else {
        response
            .header("retry-after")
            .and_then(|v| parse_retry_after(v, Utc::now()))
            .map(|d| d.as_secs())
    };
    ClientError::from_response(response.status, &response.body, retry_after_secs)
}

fn attachment_filename(disposition: &str) -> Option<String> {
    let (_, rest) = disposition.split_once("filename=")?;
    let name = rest.split(';').next()?.trim().trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockTransport, Step, json as reply, status, with_header};
    use scriptboost_api::domain::normalize::normalize;
    use scriptboost_api::models::{ContentGoal, Platform, ScriptLength, TargetAudience, Tone};

    fn travel() -> ScriptInput {
        ScriptInput {
            niche: "budget travel".into(),
            target_audience: TargetAudience::GenZ,
            content_goal: ContentGoal::Education,
            tone: Tone::Funny,
            script_length: ScriptLength::Medium,
            platform: Platform::Tiktok,
            additional_context: None,
        }
    }

    fn script() -> GeneratedScript {
        normalize(
            &json!({"hook": {"text": "Flights for $20?"}, "body": {"text": "Fly midweek."}, "cta": {"text": "Follow"}}),
            &travel(),
        )
    }

    fn ok_envelope(data: &GeneratedScript) -> Step {
        reply(200, json!({ "success": true, "data": data, "timestamp": "2026-01-01T00:00:00Z" }))
    }

    #[tokio::test(start_paused = true)]
    async fn generation_retries_with_one_idempotency_key() {
        let expected = script();
        let transport = Arc::new(MockTransport::new(vec![status(503), ok_envelope(&expected)]));
        let client = ApiClient::with_transport(transport.clone());

        let script = client.generate_script(&travel()).await.expect("script");
        assert_eq!(script, expected);

        let requests = transport.requests.lock().expect("requests");
        assert_eq!(requests.len(), 2);
        let key = |r: &HttpRequest| {
            r.headers
                .iter()
                .find(|(k, _)| k == "idempotency-key")
                .map(|(_, v)| v.clone())
        };
        assert!(key(&requests[0]).is_some());
        assert_eq!(key(&requests[0]), key(&requests[1]));
        assert_eq!(requests[0].body.as_ref().expect("body")["input"]["scriptLength"], 30);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_identical_generations_share_one_call() {
        let expected = script();
        let transport = Arc::new(MockTransport::new(vec![Step::Slow(
            Duration::from_millis(200),
            HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: Bytes::from(
                    json!({ "success": true, "data": expected, "timestamp": "t" }).to_string(),
                ),
            },
        )]));
        let client = ApiClient::with_transport(transport.clone());

        let input = travel();
        let (a, b) = tokio::join!(client.generate_script(&input), client.generate_script(&input));
        assert_eq!(a.expect("a"), expected);
        assert_eq!(b.expect("b"), expected);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_generation_is_served_from_cache() {
        let expected = script();
        let transport = Arc::new(MockTransport::new(vec![ok_envelope(&expected)]));
        let client = ApiClient::with_transport(transport.clone());

        client.generate_script(&travel()).await.expect("first");
        client.generate_script(&travel()).await.expect("second");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_error_carries_wait() {
        let transport = Arc::new(MockTransport::new(vec![with_header(
            reply(429, json!({"success": false, "error": "Rate limit exceeded", "code": "RATE_LIMITED"})),
            "retry-after",
            "42",
        )]));
        let client = ApiClient::with_transport(transport);

        let err = client.generate_script(&travel()).await.expect_err("rate limited");
        assert_eq!(err.code(), "RATE_LIMITED");
        assert_eq!(err.user_message(), "Too many requests. Try again in 42 seconds");
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_without_header_waits_default() {
        let transport = Arc::new(MockTransport::new(vec![reply(
            429,
            json!({"success": false, "error": "Rate limit exceeded", "code": "RATE_LIMITED"}),
        )]));
        let client = ApiClient::with_transport(transport.clone());

        let err = client.generate_script(&travel()).await.expect_err("rate limited");
        assert_eq!(transport.calls(), 1);
        match &err {
            ClientError::Api { retry_after_secs, .. } => assert_eq!(*retry_after_secs, Some(30)),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(err.user_message(), "Too many requests. Try again in 30 seconds");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_generation_reports_cancelled() {
        let transport = Arc::new(MockTransport::new(vec![Step::Slow(
            Duration::from_secs(10),
            HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: Bytes::new(),
            },
        )]));
        let client = ApiClient::with_transport(transport);
        let input = travel();

        let (handle, generation) = cancellable(client.generate_script(&input));
        handle.cancel();
        assert_eq!(generation.await, Err(ClientError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn export_uses_attachment_name() {
        let transport = Arc::new(MockTransport::new(vec![Step::Reply(HttpResponse {
            status: 200,
            headers: vec![
                ("content-type".into(), "application/x-subrip".into()),
                ("content-disposition".into(), "attachment; filename=\"budget_travel_abc.srt\"".into()),
            ],
            body: Bytes::from_static(b"1\n00:00:00,000 --> 00:00:03,000\nHi\n"),
        })]));
        let client = ApiClient::with_transport(transport);

        let file = client.export(&script(), ExportFormat::Srt).await.expect("export");
        assert_eq!(file.filename, "budget_travel_abc.srt");
        assert_eq!(file.content_type, "application/x-subrip");
    }

    #[tokio::test(start_paused = true)]
    async fn service_status_maps_503_to_unavailable() {
        let transport = Arc::new(MockTransport::new(vec![
            reply(200, json!({"available": true})),
            reply(503, json!({"available": false, "message": "Service temporarily unavailable"})),
        ]));
        let client = ApiClient::with_transport(transport.clone());
        assert!(client.service_available().await.expect("status"));
        assert!(!client.service_available().await.expect("status"));
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn attachment_filename_parsing() {
        assert_eq!(
            attachment_filename("attachment; filename=\"a_b.pdf\""),
            Some("a_b.pdf".to_string())
        );
        assert_eq!(attachment_filename("inline"), None);
    }
}
