//! Response relay.
//!
//! Turns a fetch outcome into the response written to the client. Success
//! and failure both carry the composed CORS headers.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::RelayError;
use crate::http::cors::CorsPolicy;
use crate::upstream::{FetchOutcome, FetchedImage};

/// `Cache-Control` sent with every relayed image.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=3600";

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Write the response for a fetch outcome.
pub fn respond(outcome: FetchOutcome, cors: &CorsPolicy, declared: Option<&str>) -> Response {
    match outcome {
        Ok(image) => image_response(image, cors, declared),
        Err(err) => error_response(&err, cors, declared),
    }
}

/// 200 with the image bytes.
pub fn image_response(image: FetchedImage, cors: &CorsPolicy, declared: Option<&str>) -> Response {
    let mut headers = HeaderMap::new();
    cors.apply(&mut headers, declared);

    let content_type = HeaderValue::from_str(&image.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("image/jpeg"));
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(image.bytes.len()));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(IMAGE_CACHE_CONTROL));
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    (StatusCode::OK, headers, Body::from(image.bytes)).into_response()
}

/// Error status with a `{"error": "..."}` body.
pub fn error_response(err: &RelayError, cors: &CorsPolicy, declared: Option<&str>) -> Response {
    let mut headers = HeaderMap::new();
    cors.apply(&mut headers, declared);

    let body = ErrorBody {
        error: err.to_string(),
    };
    (err.status(), headers, Json(body)).into_response()
}
