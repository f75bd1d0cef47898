//! Small HTTP client with redacted logging, retries, and flexible auth.
//!
//! - Request options: headers, `Auth`, query params, timeout, retries
//! - Secret query params (`api_key`, `key`, ...) are redacted in every log line
//! - Retries 429/5xx and network failures with exponential backoff and `Retry-After`
//! - JSON helpers ([`HttpClient::get_json`], [`HttpClient::post_json_opts`]) and a
//!   text helper ([`HttpClient::get_text`]) for pages that are not JSON
//! - Optional raw response logging (target `http.raw`) via `SCHOLAR_HTTP_RAW=1`
//!
//! ```no_run
//! # async fn demo() -> Result<(), scholar_http::HttpError> {
//! let client = scholar_http::HttpClient::new("https://serpapi.com")?;
//! let got: serde_json::Value = client
//!     .get_json("search.json", scholar_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "SCHOLAR_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;
/// Longest `Retry-After` honoured; anything longer fails the request.
const MAX_RETRY_AFTER_SECS: u64 = 10;

const SECRET_PARAMS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "apikey",
    "token",
    "secret",
    "client_secret",
];

fn raw_enabled() -> bool {
    matches!(
        std::env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_param(name: &str) -> bool {
    SECRET_PARAMS.contains(&name.to_ascii_lowercase().as_str())
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// How a request carries its credential.
///
/// ```
/// use scholar_http::Auth;
/// use std::borrow::Cow;
///
/// let auth = Auth::Query { name: "api_key", value: Cow::Borrowed("secret") };
/// assert_eq!(auth.kind(), "query");
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Custom header (e.g. Gemini: `x-goog-api-key`).
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    /// Query parameter (e.g. SerpAPI: `api_key`).
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
    None,
}

impl Auth<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::Header { .. } => "header",
            Auth::Query { .. } => "query",
            Auth::None => "none",
        }
    }

    /// Header auth from a raw secret, rejecting values that cannot travel in a header.
    pub fn header(name: &'static str, secret: &str) -> Result<Auth<'static>, HttpError> {
        let mut value = HeaderValue::from_str(secret.trim())
            .map_err(|e| HttpError::Build(format!("invalid {name} header: {e}")))?;
        value.set_sensitive(true);
        Ok(Auth::Header {
            name: HeaderName::from_static(name),
            value,
        })
    }
}

/// Per-request tuning knobs.
///
/// ```
/// use scholar_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(10)),
///     retries: Some(0),
///     query: Some(vec![("engine", "google_scholar".into())]),
///     ..Default::default()
/// };
/// assert_eq!(opts.retries, Some(0));
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

/// A successful non-JSON response.
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub status: StatusCode,
    /// Lowercased media type without parameters, e.g. `text/html`.
    pub content_type: Option<String>,
    /// URL after redirects.
    pub url: Url,
    pub body: String,
}

impl TextResponse {
    pub fn is_html(&self) -> bool {
        matches!(
            self.content_type.as_deref(),
            Some("text/html") | Some("application/xhtml+xml")
        )
    }
}

struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Option<Url>,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```
    /// use scholar_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://serpapi.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let mut client = Self::unanchored()?;
        client.base = Some(base);
        Ok(client)
    }

    /// A client without a base URL; every request path must be absolute.
    pub fn unanchored() -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base: None,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the retry budget. `0` means a single attempt.
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// GET JSON with per-request options.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let raw = self.execute(Method::GET, path, None, opts).await?;
        decode_json(&raw)
    }

    /// POST a JSON body and decode a JSON reply.
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let raw = self.execute(Method::POST, path, Some(bytes), opts).await?;
        decode_json(&raw)
    }

    /// GET a page as text. Non-UTF-8 bytes are replaced, never rejected.
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<TextResponse, HttpError> {
        let raw = self.execute(Method::GET, path, None, opts).await?;
        let content_type = raw
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(media_type);
        Ok(TextResponse {
            status: raw.status,
            content_type,
            url: raw.url,
            body: String::from_utf8_lossy(&raw.bytes).into_owned(),
        })
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        match &self.base {
            Some(base) => {
                if allow_absolute {
                    if let Ok(abs) = Url::parse(path) {
                        return Ok(abs);
                    }
                }
                base.join(path).map_err(|e| HttpError::Url(e.to_string()))
            }
            None => Url::parse(path).map_err(|e| HttpError::Url(e.to_string())),
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        opts: RequestOpts<'_>,
    ) -> Result<RawResponse, HttpError> {
        let url = self.resolve(path, opts.allow_absolute)?;
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut query: Vec<(&str, &str)> = opts
            .query
            .as_ref()
            .map(|q| q.iter().map(|(k, v)| (*k, v.as_ref())).collect())
            .unwrap_or_default();
        if let Some(Auth::Query { name, value }) = &opts.auth {
            query.push((*name, value.as_ref()));
        }
        let redacted_q: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| {
                let shown = if is_secret_param(k) { "<redacted>" } else { *v };
                ((*k).to_string(), shown.to_string())
            })
            .collect();
        let auth_kind = opts.auth.as_ref().map(Auth::kind).unwrap_or("none");

        let req_id = uuid::Uuid::new_v4().simple().to_string();
        let mut attempt = 0usize;

        loop {
            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout);
            if !query.is_empty() {
                rb = rb.query(&query);
            }
            if let Some(bytes) = &body {
                rb = rb
                    .header(CONTENT_TYPE, "application/json")
                    .body(bytes.clone());
            }
            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }
            if let Some(Auth::Header { name, value }) = &opts.auth {
                rb = rb.header(name, value);
            }

            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                max_retries,
                method=%method,
                host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                query=?redacted_q,
                timeout_ms=timeout.as_millis() as u64,
                auth_kind,
                has_body=body.is_some(),
                "http.request.start"
            );

            let t0 = std::time::Instant::now();
            let sent = match rb.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let headers = resp.headers().clone();
                    let final_url = resp.url().clone();
                    resp.bytes()
                        .await
                        .map(|b| RawResponse {
                            status,
                            headers,
                            url: final_url,
                            bytes: b.to_vec(),
                        })
                }
                Err(err) => Err(err),
            };

            let raw = match sent {
                Ok(raw) => raw,
                Err(err) => {
                    let failure = if err.is_timeout() {
                        HttpError::Timeout(timeout)
                    } else {
                        HttpError::Network(err.to_string())
                    };
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            error=%failure,
                            "http.retrying.network"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(req_id=%req_id, attempt, error=%failure, "http.network_error");
                    return Err(failure);
                }
            };

            let snippet = snip_body(&raw.bytes);
            tracing::debug!(
                req_id=%req_id,
                status=%raw.status,
                duration_ms=t0.elapsed().as_millis() as u64,
                body_len=raw.bytes.len(),
                "http.response"
            );
            tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");
            if raw_enabled() {
                let end = raw.bytes.len().min(RAW_MAX_BODY);
                tracing::info!(
                    target: "http.raw",
                    %req_id,
                    status=%raw.status,
                    body=%String::from_utf8_lossy(&raw.bytes[..end]),
                    truncated=raw.bytes.len() > RAW_MAX_BODY
                );
            }

            if raw.status.is_success() {
                return Ok(raw);
            }

            let message = extract_error_message(&raw.bytes);
            let is_429 = raw.status == StatusCode::TOO_MANY_REQUESTS;
            let retry_after = retry_after_delay_secs(&raw.headers);
            // a server asking for a long wait gets its error reported instead
            let wait_acceptable = retry_after.is_none_or(|secs| secs <= MAX_RETRY_AFTER_SECS);
            if (is_429 || raw.status.is_server_error()) && attempt < max_retries && wait_acceptable {
                attempt += 1;
                let delay = match retry_after {
                    Some(secs) => Duration::from_secs(secs),
                    None if is_429 => backoff(attempt).max(Duration::from_millis(1100)),
                    None => backoff(attempt),
                };
                tracing::warn!(
                    req_id=%req_id,
                    status=%raw.status,
                    attempt,
                    max_retries,
                    backoff_ms=delay.as_millis() as u64,
                    message=%message,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id=%req_id,
                status=%raw.status,
                message=%message,
                body_snippet=%snippet,
                "http.error"
            );
            return Err(HttpError::Api {
                status: raw.status,
                message,
            });
        }
    }
}

fn decode_json<T: DeserializeOwned>(raw: &RawResponse) -> Result<T, HttpError> {
    serde_json::from_slice::<T>(&raw.bytes).map_err(|e| {
        let snippet = snip_body(&raw.bytes);
        tracing::warn!(
            serde_line=%e.line(),
            serde_col=%e.column(),
            serde_err=%e,
            body_snippet=%snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

fn backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(10) as u32;
    Duration::from_millis(200u64.saturating_mul(1 << shift))
}

fn media_type(raw: &str) -> String {
    raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

/// Pull a human message out of common error envelopes.
///
/// Google: `{"error":{"message":"..."}}`; SerpAPI: `{"error":"..."}`;
/// generic: `{"message":"..."}`. Falls back to a body snippet.
fn extract_error_message(body: &[u8]) -> String {
    if let Ok(val) = serde_json::from_slice::<serde_json::Value>(body) {
        let candidates = [
            val.pointer("/error/message"),
            val.get("error"),
            val.get("message"),
            val.get("detail"),
        ];
        for candidate in candidates.into_iter().flatten() {
            if let Some(s) = candidate.as_str().filter(|s| !s.is_empty()) {
                return s.to_string();
            }
        }
    }
    snip_body(body)
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(SNIPPET_MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}

/// Header map with a browser-like `User-Agent`, for page fetches.
pub fn user_agent_headers(agent: &str) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    let value =
        HeaderValue::from_str(agent).map_err(|e| HttpError::Build(format!("invalid user agent: {e}")))?;
    headers.insert(USER_AGENT, value);
    Ok(headers)
}
