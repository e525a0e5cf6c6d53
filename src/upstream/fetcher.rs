//! Upstream image fetcher.
//!
//! # Responsibilities
//! - GET the target with browser-like headers and `Referer` set to the target's own origin
//! - Bound the whole exchange (headers and body) by one absolute timeout
//! - Reject non-2xx statuses and non-image content types as soon as headers arrive
//! - Enforce the byte budget while the body streams in
//!
//! # Design Decisions
//! - No retries: a failed fetch is reported once
//! - Timeout drops the in-flight future, which closes the connection
//! - Missing `Content-Type` is treated as `image/jpeg`

use std::time::{Duration, Instant};

use axum::body::Bytes;
use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::config::UpstreamConfig;
use crate::error::{RelayError, RelayResult};
use crate::observability::metrics;
use crate::upstream::body::read_limited;
use crate::upstream::target::ValidatedUrl;

/// Content type assumed when upstream does not send one.
pub const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

const ACCEPT_IMAGES: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// A successfully fetched image.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Outcome of one upstream fetch.
pub type FetchOutcome = RelayResult<FetchedImage>;

/// Performs bounded downloads of remote images.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: u64,
}

impl Fetcher {
    /// Build a fetcher and its connection pool from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let redirect = if config.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(config.max_redirects)
        };

        let mut builder = reqwest::Client::builder()
            .default_headers(default_headers())
            .user_agent(config.user_agent.clone())
            .redirect(redirect)
            // Every hop carries the origin-only Referer set per request, never the previous URL.
            .referer(false);
        if !config.use_env_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            timeout: Duration::from_millis(config.timeout_ms),
            max_bytes: config.max_bytes,
        })
    }

    /// Fetch `target`, enforcing the timeout, status, content-type and size rules.
    pub async fn fetch(&self, target: &ValidatedUrl) -> FetchOutcome {
        let start = Instant::now();

        let outcome = match tokio::time::timeout(self.timeout, self.fetch_inner(target)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!(
                    url = %target.as_str(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Upstream fetch timed out"
                );
                Err(RelayError::UpstreamTimeout)
            }
        };

        metrics::record_fetch(&outcome, start);
        outcome
    }

    async fn fetch_inner(&self, target: &ValidatedUrl) -> FetchOutcome {
        let mut request = self.client.get(target.url().clone());
        if let Ok(referer) = HeaderValue::from_str(target.origin()) {
            request = request.header(header::REFERER, referer);
        }

        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %target.as_str(), status = %status, "Upstream returned error status");
            return Err(RelayError::UpstreamStatus(status));
        }

        let content_type = image_content_type(response.headers())?;

        let declared_len = response.content_length();
        if let Some(len) = declared_len {
            if len > self.max_bytes {
                tracing::warn!(
                    url = %target.as_str(),
                    content_length = len,
                    max_bytes = self.max_bytes,
                    "Upstream declared an oversized body"
                );
                return Err(RelayError::PayloadTooLarge { limit: self.max_bytes });
            }
        }

        let body = read_limited(response.bytes_stream(), self.max_bytes, declared_len)
            .await
            .map_err(|e| {
                if let RelayError::FetchFailed(detail) = &e {
                    tracing::error!(url = %target.as_str(), error = %detail, "Upstream body read failed");
                }
                e
            })?;

        tracing::debug!(
            url = %target.as_str(),
            content_type = %content_type,
            bytes = body.len(),
            "Fetched upstream image"
        );

        Ok(FetchedImage {
            content_type,
            bytes: Bytes::from(body),
        })
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_IMAGES));
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

/// Extract the upstream content type, defaulting to `image/jpeg` and
/// rejecting anything outside `image/*`.
pub fn image_content_type(headers: &HeaderMap) -> RelayResult<String> {
    let value = match headers.get(header::CONTENT_TYPE) {
        None => {
            tracing::warn!("Upstream sent no Content-Type, assuming {}", FALLBACK_CONTENT_TYPE);
            return Ok(FALLBACK_CONTENT_TYPE.to_string());
        }
        Some(value) => value,
    };

    let content_type = value
        .to_str()
        .map_err(|_| RelayError::NotAnImage(String::from_utf8_lossy(value.as_bytes()).into_owned()))?
        .trim();

    if content_type.to_ascii_lowercase().starts_with("image/") {
        Ok(content_type.to_string())
    } else {
        tracing::warn!(content_type = %content_type, "Upstream content is not an image");
        Err(RelayError::NotAnImage(content_type.to_string()))
    }
}

fn map_transport_error(err: reqwest::Error) -> RelayError {
    if err.is_timeout() {
        tracing::error!(error = %err, "Upstream connection timed out");
        return RelayError::UpstreamTimeout;
    }
    let detail = error_chain(&err);
    tracing::error!(error = %detail, "Upstream request failed");
    RelayError::FetchFailed(detail)
}

/// Render an error with all of its sources, e.g. `error sending request: dns error: ...`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
