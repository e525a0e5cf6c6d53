//! Failure taxonomy for the relay pipeline.
//!
//! Every stage (origin gate, URL validation, upstream fetch, admission
//! control) fails with a [`RelayError`]. The `Display` text is what the
//! client sees in the JSON body; transport detail stays in the logs.

use axum::http::StatusCode;
use thiserror::Error;

/// Why the origin gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// Neither `Origin` nor `Referer` was sent.
    NoOrigin,
    /// The header value is not a parseable URL.
    InvalidOrigin,
    /// The parsed origin is not in the allowlist.
    OriginNotAllowed,
}

impl ForbiddenReason {
    /// Short label used for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ForbiddenReason::NoOrigin => "no-origin",
            ForbiddenReason::InvalidOrigin => "invalid-origin",
            ForbiddenReason::OriginNotAllowed => "origin-not-allowed",
        }
    }
}

/// Errors that can occur while relaying an image.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing url parameter")]
    MissingParameter,

    #[error("Invalid URL")]
    MalformedUrl,

    #[error("Only HTTP and HTTPS URLs are allowed")]
    UnsupportedScheme(String),

    #[error("{}", forbidden_message(.0))]
    Forbidden(ForbiddenReason),

    /// Upstream answered with a non-2xx status.
    #[error("Failed to fetch image: {0}")]
    UpstreamStatus(StatusCode),

    /// Upstream `Content-Type` is not `image/*`.
    #[error("URL does not point to a valid image")]
    NotAnImage(String),

    #[error("Image too large (max {limit} bytes)")]
    PayloadTooLarge { limit: u64 },

    #[error("Failed to proxy image")]
    UpstreamTimeout,

    /// DNS, connection, TLS or body read failure. The detail is only logged.
    #[error("Failed to proxy image")]
    FetchFailed(String),

    #[error("Too many concurrent requests")]
    Overloaded,
}

fn forbidden_message(reason: &ForbiddenReason) -> &'static str {
    match reason {
        ForbiddenReason::NoOrigin => "Forbidden: missing origin",
        ForbiddenReason::InvalidOrigin => "Forbidden: invalid origin",
        ForbiddenReason::OriginNotAllowed => "Forbidden: origin not allowed",
    }
}

impl RelayError {
    /// HTTP status returned to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingParameter
            | RelayError::MalformedUrl
            | RelayError::UnsupportedScheme(_)
            | RelayError::NotAnImage(_) => StatusCode::BAD_REQUEST,
            RelayError::Forbidden(_) => StatusCode::FORBIDDEN,
            RelayError::UpstreamStatus(status) => *status,
            RelayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::UpstreamTimeout | RelayError::FetchFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MissingParameter => "missing_parameter",
            RelayError::MalformedUrl => "malformed_url",
            RelayError::UnsupportedScheme(_) => "unsupported_scheme",
            RelayError::Forbidden(_) => "forbidden",
            RelayError::UpstreamStatus(_) => "upstream_status",
            RelayError::NotAnImage(_) => "not_an_image",
            RelayError::PayloadTooLarge { .. } => "payload_too_large",
            RelayError::UpstreamTimeout => "upstream_timeout",
            RelayError::FetchFailed(_) => "fetch_failed",
            RelayError::Overloaded => "overloaded",
        }
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
