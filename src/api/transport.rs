//! HTTP transport, error classification and retry
//!
//! [`Transport`] is the seam between the client and the wire: the default
//! implementation is reqwest, tests plug in scripted fakes. [`HttpClient`]
//! wraps a transport with the rate limiter, the retry policy and the caller's
//! cancellation signal, and turns every non-2xx answer into a structured
//! [`Error`] through [`classify_response`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use super::builder::Params;
use super::cancel::CancelToken;
use super::rate_limit::{Admission, RateLimiter};
use crate::error::{
    ApiError, AuthenticationError, Error, NetworkError, RateLimitError, Result, ValidationError,
};

/// Platform error codes that mean "slow down"
const RATE_LIMIT_CODES: [i64; 4] = [4, 17, 32, 613];
/// Platform error code for an invalid or expired token
const INVALID_TOKEN_CODE: i64 = 190;
/// Platform error code for a permission problem
const PERMISSION_CODE: i64 = 10;

/// Capped exponential backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub const fn disabled() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    /// Delay before retry number `attempt` (zero-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());
        if capped.is_finite() && capped > 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.max_delay
        }
    }
}

/// One outgoing call
#[derive(Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL without query string
    pub url: String,
    /// Query parameters
    pub query: Params,
    /// Form body (sent only when non-empty)
    pub form: Params,
    /// Bearer token, if the call is authenticated
    pub bearer: Option<String>,
}

impl ApiRequest {
    /// Request with no parameters
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Params::new(),
            form: Params::new(),
            bearer: None,
        }
    }

    /// Replace the query
    pub fn query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    /// Replace the form body
    pub fn form(mut self, form: Params) -> Self {
        self.form = form;
        self
    }

    /// Attach a bearer token
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

// Tokens never reach logs
impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query.keys())
            .field("form", &self.form.keys())
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// What came back, before classification
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// HTTP status
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: String,
}

impl RawResponse {
    /// Response with an empty header map
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// 2xx
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Sends one request and returns the raw response
///
/// Transport-level failures come back as [`Error::Network`]; HTTP error
/// statuses are returned as responses and classified by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the call
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with a per-request timeout and User-Agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse> {
        let url = if request.query.is_empty() {
            Url::parse(&request.url)
        } else {
            Url::parse_with_params(&request.url, request.query.as_slice())
        }
        .map_err(|e| Error::Other(format!("Invalid request URL {}: {e}", request.url)))?;

        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        if !request.form.is_empty() {
            builder = builder.form(request.form.as_slice());
        }

        let response = builder.send().await.map_err(|e| network_error(&e))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| network_error(&e))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn network_error(err: &reqwest::Error) -> Error {
    let mut description = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    Error::Network(classify_transport_failure(&description, err.is_timeout()))
}

/// Map a transport failure description onto a [`NetworkError`]
///
/// Timeouts and unknown failures are temporary. DNS, TLS and refused
/// connections are configuration problems and are not retried.
pub fn classify_transport_failure(description: &str, timed_out: bool) -> NetworkError {
    let lower = description.to_ascii_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    let (message, temporary) = if timed_out || has(&["timed out", "timeout"]) {
        ("request timed out", true)
    } else if has(&[
        "dns",
        "failed to lookup",
        "no such host",
        "name or service not known",
        "nodename nor servname",
    ]) {
        ("DNS lookup failed", false)
    } else if has(&["certificate", "tls", "ssl", "handshake"]) {
        ("TLS handshake failed", false)
    } else if has(&["connection refused"]) {
        ("connection refused", false)
    } else {
        ("network request failed", true)
    };

    NetworkError::new(0, message, description, temporary)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
    code: i64,
    error_subcode: Option<i64>,
    error_user_msg: String,
    fbtrace_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Turn a non-2xx response into a structured error
///
/// Pure: the same status, headers and body always yield an equal error.
pub fn classify_response(status: u16, headers: &HeaderMap, body: &str) -> Error {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let info = parsed.as_ref().map(|e| &e.error);
    let platform_code = info.map_or(0, |e| e.code);
    let status_code = i64::from(status);

    let message = info
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| default_message(status).to_string());
    let details = match info {
        Some(e) if !e.error_user_msg.is_empty() => e.error_user_msg.clone(),
        Some(e) if !e.error_type.is_empty() => match e.error_subcode {
            Some(sub) => format!("type={} code={} subcode={sub}", e.error_type, e.code),
            None => format!("type={} code={}", e.error_type, e.code),
        },
        Some(_) => String::new(),
        None => body.chars().take(200).collect(),
    };
    let request_id = header_str(headers, "x-fb-trace-id")
        .or_else(|| header_str(headers, "x-fb-request-id"))
        .or_else(|| info.map(|e| e.fbtrace_id.clone()).filter(|id| !id.is_empty()))
        .unwrap_or_default();

    if status == 429 || RATE_LIMIT_CODES.contains(&platform_code) {
        let code = if status == 429 { status_code } else { platform_code };
        let retry_after = retry_after(headers).unwrap_or_default();
        return RateLimitError::new(code, message, details, retry_after).into();
    }

    if status == 401 || platform_code == INVALID_TOKEN_CODE {
        return AuthenticationError::new(401, message, details).into();
    }
    if status == 403 || platform_code == PERMISSION_CODE || (200..300).contains(&platform_code) {
        return AuthenticationError::new(403, message, details).into();
    }

    match status {
        400 => ValidationError::new(status_code, message.clone(), details, field_from_message(&message))
            .into(),
        404 | 410 => ApiError::new(status_code, message, details, request_id).into(),
        s if s >= 500 => NetworkError::new(status_code, message, details, true).into(),
        _ => ApiError::new(status_code, message, details, request_id).into(),
    }
}

const fn default_message(status: u16) -> &'static str {
    match status {
        400 => "bad request",
        401 => "unauthorized",
        403 => "forbidden",
        404 => "not found",
        410 => "deleted",
        429 => "rate limit exceeded",
        500..=599 => "server error",
        _ => "unexpected response",
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `Retry-After` as seconds or an HTTP date
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = header_str(headers, "retry-after")?;
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = chrono::DateTime::parse_from_rfc2822(&raw).ok()?;
    (at.with_timezone(&chrono::Utc) - chrono::Utc::now()).to_std().ok()
}

/// The platform phrases parameter errors as `(#100) Param text must be ...`
fn field_from_message(message: &str) -> String {
    message
        .split_once("Param ")
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .map(|field| {
            field
                .trim_end_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != ']')
                .to_string()
        })
        .unwrap_or_default()
}

/// Transport plus rate limiting, retry and cancellation
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    rate_limiter: Arc<RateLimiter>,
    retry: RetryConfig,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("rate_limiter", &self.rate_limiter)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Wrap a transport
    pub fn new(
        transport: Arc<dyn Transport>,
        rate_limiter: Arc<RateLimiter>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            transport,
            rate_limiter,
            retry,
        }
    }

    /// Shared rate limiter
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    async fn admit(&self, cancel: &CancelToken) -> Result<()> {
        match self.rate_limiter.admission() {
            Admission::Proceed => Ok(()),
            Admission::Delay(delay) => {
                debug!(delay_ms = delay.as_millis(), "Delaying request for rate limit");
                cancel.sleep(delay).await
            }
            Admission::Reject(retry_after) => Err(RateLimitError::new(
                429,
                "rate limit exhausted",
                "request not sent",
                retry_after,
            )
            .into()),
        }
    }

    /// Send with admission control, classification and bounded retry
    pub async fn send(&self, request: &ApiRequest, cancel: &CancelToken) -> Result<RawResponse> {
        let mut attempt = 0;
        loop {
            self.admit(cancel).await?;
            debug!(method = %request.method, url = %request.url, attempt, "Sending request");

            let err = match cancel.run(self.transport.execute(request)).await? {
                Ok(response) => {
                    self.rate_limiter.update_from_headers(&response.headers);
                    if response.is_success() {
                        return Ok(response);
                    }
                    classify_response(response.status, &response.headers, &response.body)
                }
                Err(err) => err,
            };

            if let Some(limit) = err.as_rate_limit() {
                self.rate_limiter.mark_exhausted(limit.retry_after);
            }

            if err.is_temporary() && attempt < self.retry.max_retries {
                let delay = self.retry.delay_for(attempt);
                warn!(
                    url = %request.url,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "Retrying request"
                );
                cancel.sleep(delay).await?;
                attempt += 1;
                continue;
            }

            return Err(err);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::rate_limit::RateLimiterConfig;
    use reqwest::header::HeaderValue;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays canned outcomes and counts calls
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<RawResponse>>>,
        pub(crate) calls: AtomicUsize,
        pub(crate) requests: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(outcomes: Vec<Result<RawResponse>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn ok(bodies: &[&str]) -> Self {
            Self::new(
                bodies
                    .iter()
                    .map(|body| Ok(RawResponse::new(200, *body)))
                    .collect(),
            )
        }

        pub(crate) fn recorded(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, request: &ApiRequest) -> Result<RawResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RawResponse::new(500, "script exhausted")))
        }
    }

    fn http(transport: Arc<ScriptedTransport>) -> HttpClient {
        HttpClient::new(
            transport,
            Arc::new(RateLimiter::new(RateLimiterConfig::default())),
            RetryConfig::default(),
        )
    }

    fn request() -> ApiRequest {
        ApiRequest::new(Method::GET, "https://graph.threads.net/v1.0/me")
    }

    #[test]
    fn test_backoff_is_capped() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for(0), Duration::from_secs(1));
        assert_eq!(retry.delay_for(1), Duration::from_secs(2));
        assert_eq!(retry.delay_for(2), Duration::from_secs(4));
        assert_eq!(retry.delay_for(10), Duration::from_secs(30));
    }

    #[test]
    fn test_classify_statuses() {
        let h = HeaderMap::new();
        assert!(classify_response(401, &h, "").is_authentication());
        assert!(classify_response(403, &h, "").is_authentication());
        assert!(classify_response(429, &h, "").is_rate_limit());
        assert!(classify_response(400, &h, "").is_validation());
        assert!(classify_response(502, &h, "").is_temporary());
        assert!(classify_response(418, &h, "").is_api());

        let not_found = classify_response(404, &h, "");
        assert_eq!(not_found.code(), Some(404));
        assert_eq!(not_found.message(), "not found");
        let gone = classify_response(410, &h, "");
        assert_eq!(gone.code(), Some(410));
        assert_eq!(gone.message(), "deleted");
    }

    #[test]
    fn test_classify_platform_codes() {
        let h = HeaderMap::new();
        let expired = r#"{"error":{"message":"Error validating access token: Session has expired","type":"OAuthException","code":190}}"#;
        let err = classify_response(400, &h, expired);
        assert!(err.is_authentication());
        assert!(err.message().contains("expired"));

        let throttled = r#"{"error":{"message":"Application request limit reached","type":"OAuthException","code":4}}"#;
        assert!(classify_response(400, &h, throttled).is_rate_limit());

        let param = r#"{"error":{"message":"(#100) Param text must be at most 500 characters long.","type":"OAuthException","code":100}}"#;
        let err = classify_response(400, &h, param);
        assert_eq!(err.validation_field(), Some("text"));
    }

    #[test]
    fn test_classify_retry_after_and_request_id() {
        let mut h = HeaderMap::new();
        h.insert("retry-after", HeaderValue::from_static("120"));
        h.insert("x-fb-trace-id", HeaderValue::from_static("trace-1"));
        assert_eq!(
            classify_response(429, &h, "").retry_after(),
            Some(Duration::from_secs(120))
        );
        assert_eq!(classify_response(418, &h, "").request_id(), Some("trace-1"));
        assert_eq!(
            classify_response(429, &HeaderMap::new(), "").retry_after(),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let h = HeaderMap::new();
        let body = r#"{"error":{"message":"Invalid parameter","type":"OAuthException","code":100}}"#;
        assert_eq!(classify_response(400, &h, body), classify_response(400, &h, body));
    }

    #[test]
    fn test_transport_failure_classification() {
        assert!(classify_transport_failure("operation timed out", false).temporary);
        assert!(classify_transport_failure("anything", true).temporary);
        assert!(!classify_transport_failure("dns error: failed to lookup address", false).temporary);
        assert!(!classify_transport_failure("invalid peer certificate", false).temporary);
        assert!(!classify_transport_failure("Connection refused (os error 111)", false).temporary);
        assert!(classify_transport_failure("connection reset by peer", false).temporary);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_server_errors_then_succeeds() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(RawResponse::new(503, "")),
            Ok(RawResponse::new(500, "")),
            Ok(RawResponse::new(200, "{}")),
        ]));
        let client = http(transport.clone());
        let response = client.send(&request(), &CancelToken::new()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let transport = Arc::new(ScriptedTransport::new(
            (0..10).map(|_| Ok(RawResponse::new(503, ""))).collect(),
        ));
        let client = http(transport.clone());
        let err = client.send(&request(), &CancelToken::new()).await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_are_not_retried() {
        for status in [400, 401, 404, 429] {
            let transport = Arc::new(ScriptedTransport::new(vec![
                Ok(RawResponse::new(status, "")),
                Ok(RawResponse::new(200, "{}")),
            ]));
            let client = http(transport.clone());
            assert!(client.send(&request(), &CancelToken::new()).await.is_err());
            assert_eq!(transport.calls.load(Ordering::SeqCst), 1, "status {status}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_network_errors_are_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![Err(Error::Network(
            classify_transport_failure("connection refused", false),
        ))]));
        let client = http(transport.clone());
        let err = client.send(&request(), &CancelToken::new()).await.unwrap_err();
        assert!(err.is_network());
        assert!(!err.is_temporary());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let transport = Arc::new(ScriptedTransport::new(
            (0..10).map(|_| Ok(RawResponse::new(503, ""))).collect(),
        ));
        let client = http(transport.clone());
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });
        let err = client.send(&request(), &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_marks_limiter() {
        let mut response = RawResponse::new(429, "");
        response
            .headers
            .insert("retry-after", HeaderValue::from_static("600"));
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(response)]));
        let client = http(transport.clone());

        let err = client.send(&request(), &CancelToken::new()).await.unwrap_err();
        assert!(err.is_rate_limit());
        assert!(client.rate_limiter().should_wait());

        // The next call is rejected before reaching the transport
        let err = client.send(&request(), &CancelToken::new()).await.unwrap_err();
        assert!(err.is_rate_limit());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }
}
