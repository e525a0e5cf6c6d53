//! CORS header composition.
//!
//! Chooses the `Access-Control-Allow-Origin` value for every response the
//! relay writes: success, error and preflight alike.
//!
//! The chosen value never grants access by itself. Whether a request is
//! served is decided by the origin gate; a rejected request still gets a
//! header here so the calling page can read the JSON error.

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::security::allowlist::{normalize_origin, OriginAllowlist};

pub const ALLOW_METHODS: &str = "GET";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Composes CORS headers from the configured allowlist.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowlist: Arc<OriginAllowlist>,
}

impl CorsPolicy {
    pub fn new(allowlist: Arc<OriginAllowlist>) -> Self {
        Self { allowlist }
    }

    /// Pick the `Access-Control-Allow-Origin` value for a declared origin.
    ///
    /// 1. the declared origin, if it normalizes to an allowlist member
    /// 2. otherwise the first configured origin
    /// 3. otherwise `*`
    pub fn allow_origin(&self, declared: Option<&str>) -> HeaderValue {
        let echoed = declared
            .filter(|_| !self.allowlist.is_empty())
            .and_then(normalize_origin)
            .filter(|origin| self.allowlist.is_allowed(origin));

        echoed
            .as_deref()
            .or_else(|| self.allowlist.first())
            .and_then(|origin| HeaderValue::from_str(origin).ok())
            .unwrap_or_else(|| HeaderValue::from_static("*"))
    }

    /// Insert the CORS headers into `headers`.
    pub fn apply(&self, headers: &mut HeaderMap, declared: Option<&str>) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin(declared));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }

    /// Answer a preflight: 204, CORS headers, empty body. Never origin-gated.
    pub fn preflight(&self, declared: Option<&str>) -> Response {
        let mut headers = HeaderMap::new();
        self.apply(&mut headers, declared);
        (StatusCode::NO_CONTENT, headers).into_response()
    }
}
