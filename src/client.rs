//! Authenticated HTTP client for the Admin SDK Directory API.
//!
//! `CbcmClient` is bound to one customer: every operation path is resolved
//! relative to `…/customer/{customer}/`. The bearer token and content
//! headers are installed once as default headers and never change for the
//! life of the client.
//!
//! Retry policy:
//! - Only idempotent methods (GET, PUT, DELETE) are retried.
//! - Retried statuses are 429, 500, 502, 503 and 504.
//! - Connection failures are retried for any method; timeouts and dropped
//!   connections only for idempotent ones.
//! - Up to [`RetryPolicy::max_retries`] retries with exponential backoff
//!   (1s, 2s, 4s, … capped at 120s). A `Retry-After` header in seconds
//!   replaces the computed delay, under the same cap.
//! - When retries run out the last response becomes
//!   [`CbcmError::RetriesExhausted`].
//!
//! Any other status is returned to the caller as an [`ApiResponse`]; the
//! caller decides whether a non-2xx status is fatal (data-returning
//! commands) or reportable (batched moves).

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::{CbcmError, Result};

/// Root of the Directory API version that serves Chrome browser management.
pub const BASE_URL: &str = "https://www.googleapis.com/admin/directory/v1.1beta1/";

const USER_AGENT: &str = concat!("cbcm/", env!("CARGO_PKG_VERSION"));

const API_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall per-attempt timeout. Backoff sleeps are not counted.
const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const RETRY_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Query parameters for one request. Only flags the caller supplied are
/// inserted; an absent key is never sent.
pub type Params = BTreeMap<&'static str, String>;

/// Backoff schedule for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay, including `Retry-After`.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 7,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries as many times as the default but never sleeps.
    pub fn immediate() -> Self {
        RetryPolicy {
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

fn is_retryable(method: &Method, status: StatusCode) -> bool {
    let idempotent = matches!(*method, Method::GET | Method::PUT | Method::DELETE);
    idempotent && RETRY_STATUSES.contains(&status)
}

/// Connection failures are retried for every method; timeouts, dropped
/// connections and truncated bodies only for idempotent ones.
fn is_retryable_error(method: &Method, err: &reqwest::Error) -> bool {
    if err.is_connect() {
        return true;
    }
    let idempotent = matches!(*method, Method::GET | Method::PUT | Method::DELETE);
    idempotent && (err.is_timeout() || err.is_request() || err.is_body())
}

/// Sends one attempt and reads the whole body.
async fn exchange(
    req: reqwest::RequestBuilder,
) -> std::result::Result<(StatusCode, Option<Duration>, String), reqwest::Error> {
    let resp = req.send().await?;
    let status = resp.status();
    let server_delay = retry_after(resp.headers());
    let text = resp.text().await?;
    Ok((status, server_delay, text))
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Status and raw body of a completed request.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status of the final attempt.
    pub status: StatusCode,
    /// Response body as text; may be empty.
    pub body: String,
}

impl ApiResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Canonical reason phrase, or an empty string for unknown codes.
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Converts a non-2xx response into [`CbcmError::Api`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CbcmError::Api {
                status: self.status,
                body: self.body,
            })
        }
    }

    /// Parses the body of a successful response as JSON.
    pub fn json(self) -> Result<Value> {
        let resp = self.error_for_status()?;
        Ok(serde_json::from_str(&resp.body)?)
    }
}

/// HTTP client bound to one customer of the Directory API.
pub struct CbcmClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl CbcmClient {
    /// Client for `customer` against the production API.
    pub fn new(customer: &str, access_token: &str) -> Result<Self> {
        Self::with_base_url(BASE_URL, customer, access_token)
    }

    /// Client rooted at `root` instead of the production API root. `root`
    /// must end with `/`. Tests point this at a mock server.
    pub fn with_base_url(root: &str, customer: &str, access_token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|err| {
                CbcmError::Auth {
                    message: "access token contains invalid header characters".to_string(),
                    source: Some(Box::new(err)),
                }
            })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(API_CONNECT_TIMEOUT)
            .timeout(API_REQUEST_TIMEOUT)
            .build()?;

        Ok(CbcmClient {
            client,
            base_url: format!("{root}customer/{customer}/"),
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Base URL every operation path is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a request, retrying transient failures per the retry policy.
    ///
    /// `path` is relative to [`CbcmClient::base_url`]. `body` is sent as
    /// JSON when present.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        params: &Params,
        body: Option<&B>,
    ) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            tracing::debug!(%method, %url, ?params, attempt, "sending request");

            let mut req = self.client.request(method.clone(), &url).query(params);
            if let Some(payload) = body {
                req = req.json(payload);
            }

            let (status, server_delay, text) = match exchange(req).await {
                Ok(done) => done,
                Err(err)
                    if is_retryable_error(&method, &err) && attempt <= self.retry.max_retries =>
                {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        error = %err,
                        %url,
                        retry = attempt,
                        ?delay,
                        "transport error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            tracing::debug!(%status, bytes = text.len(), "received response");

            if !is_retryable(&method, status) {
                return Ok(ApiResponse { status, body: text });
            }
            if attempt > self.retry.max_retries {
                return Err(CbcmError::RetriesExhausted {
                    attempts: attempt,
                    status,
                    body: text,
                });
            }

            let delay = server_delay
                .map(|d| d.min(self.retry.max_backoff))
                .unwrap_or_else(|| self.retry.delay(attempt));
            tracing::warn!(%status, %url, retry = attempt, ?delay, "transient error, retrying");
            tokio::time::sleep(delay).await;
        }
    }

    /// GET `path` with `params`.
    pub async fn get(&self, path: &str, params: &Params) -> Result<ApiResponse> {
        self.send::<()>(Method::GET, path, params, None).await
    }

    /// PUT `body` to `path`.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &Params,
        body: &B,
    ) -> Result<ApiResponse> {
        self.send(Method::PUT, path, params, Some(body)).await
    }

    /// POST to `path`, with or without a body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &Params,
        body: Option<&B>,
    ) -> Result<ApiResponse> {
        self.send(Method::POST, path, params, body).await
    }

    /// DELETE `path`.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send::<()>(Method::DELETE, path, &Params::new(), None)
            .await
    }
}
