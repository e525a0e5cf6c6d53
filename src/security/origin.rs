//! Origin gate.
//!
//! Decides whether a proxied request may proceed, based on the `Origin`
//! header (falling back to `Referer`). Runs before any URL parsing or
//! upstream work.
//!
//! # Threat model
//! `Origin`/`Referer` are trivially forged by non-browser clients. The gate
//! only keeps other web pages from embedding the relay through the browser's
//! CORS machinery; it is not authentication.

use axum::http::{header, HeaderMap, HeaderValue};
use url::Url;

use crate::error::{ForbiddenReason, RelayError, RelayResult};
use crate::security::allowlist::{web_origin, OriginAllowlist};

/// The origin a request claims: `Origin`, or `Referer` when `Origin` is
/// absent or empty.
pub fn declared_origin(headers: &HeaderMap) -> Option<&HeaderValue> {
    headers
        .get(header::ORIGIN)
        .filter(|v| !v.is_empty())
        .or_else(|| headers.get(header::REFERER).filter(|v| !v.is_empty()))
}

/// Check the declared origin against the allowlist.
///
/// Returns the normalized origin on success.
pub fn check_origin(headers: &HeaderMap, allowlist: &OriginAllowlist) -> RelayResult<String> {
    let value = declared_origin(headers).ok_or(RelayError::Forbidden(ForbiddenReason::NoOrigin))?;

    let raw = value
        .to_str()
        .map_err(|_| RelayError::Forbidden(ForbiddenReason::InvalidOrigin))?;

    let url = Url::parse(raw.trim())
        .map_err(|_| RelayError::Forbidden(ForbiddenReason::InvalidOrigin))?;
    // A parseable URL with a non-http scheme is still not an allowable origin.
    let origin =
        web_origin(&url).ok_or(RelayError::Forbidden(ForbiddenReason::OriginNotAllowed))?;

    if allowlist.is_allowed(&origin) {
        Ok(origin)
    } else {
        Err(RelayError::Forbidden(ForbiddenReason::OriginNotAllowed))
    }
}
