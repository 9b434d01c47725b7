use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = concat!("reel-info-api/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_ERROR_BODY: usize = 1024;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream returned {status}")]
    Http { status: StatusCode, body: String },
    #[error("{0}")]
    Network(String),
    #[error("upstream body is not JSON: {0}")]
    InvalidBody(String),
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Calls the extraction API. Built once at startup; the inner
/// `reqwest::Client` owns the connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl UpstreamClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, UpstreamError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    /// One attempt, no retries. `post_url` is percent-encoded into the
    /// `url` query parameter here.
    pub async fn fetch(&self, post_url: &str) -> Result<Value, UpstreamError> {
        let target = self.request_url(post_url);

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => match classify(e) {
                    UpstreamError::Timeout => return Err(UpstreamError::Timeout),
                    other => {
                        tracing::debug!(%status, error = %other, "could not read upstream error body");
                        String::new()
                    }
                },
            };
            return Err(UpstreamError::Http {
                status,
                body: truncate(body, MAX_ERROR_BODY),
            });
        }

        let bytes = response.bytes().await.map_err(classify)?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::InvalidBody(e.to_string()))
    }

    fn request_url(&self, post_url: &str) -> Url {
        let mut target = self.endpoint.clone();
        target.query_pairs_mut().append_pair("url", post_url);
        target
    }
}

fn classify(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout
    } else if e.is_connect() {
        UpstreamError::Network(format!("ConnectError: {}", e))
    } else if e.is_decode() || e.is_body() {
        UpstreamError::Network(format!("BodyError: {}", e))
    } else {
        UpstreamError::Network(format!("RequestError: {}", e))
    }
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}
