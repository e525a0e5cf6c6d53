//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID)
//! - Run the proxy pipeline: origin gate → admission → URL validation → fetch → relay
//! - Serve until the shutdown signal fires

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::http::cors::CorsPolicy;
use crate::http::request::{make_span, UuidRequestId};
use crate::http::{health, relay};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::security::{check_origin, declared_origin, ConcurrencyLimit, OriginAllowlist};
use crate::upstream::{self, FetchOutcome, Fetcher};

/// Application state injected into handlers.
///
/// Everything here is read-only after construction.
#[derive(Clone)]
pub struct AppState {
    pub allowlist: Arc<OriginAllowlist>,
    pub cors: CorsPolicy,
    pub fetcher: Fetcher,
    pub limit: ConcurrencyLimit,
}

impl AppState {
    /// Build all request-time components from configuration.
    pub fn new(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let allowlist = Arc::new(OriginAllowlist::new(&config.cors.allowed_origins));
        let fetcher = Fetcher::new(&config.upstream)?;

        Ok(Self {
            cors: CorsPolicy::new(allowlist.clone()),
            limit: ConcurrencyLimit::new(config.limits.max_concurrent_requests),
            allowlist,
            fetcher,
        })
    }
}

/// HTTP server for the image relay.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let state = AppState::new(&config)?;
        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(proxy_handler).options(preflight_handler))
            .route("/health", get(health::health))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(make_span))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            allowed_origins = self.state.allowlist.len(),
            "HTTP server starting"
        );
        if self.state.allowlist.is_empty() {
            tracing::warn!("No allowed origins configured, every proxy request will be rejected");
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `GET /?url=...`: relay one image.
async fn proxy_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let declared = declared_origin(&headers).and_then(|v| v.to_str().ok());
    let outcome = proxy_image(&state, query.as_deref(), &headers).await;

    match &outcome {
        Ok(image) => {
            metrics::record_request("success");
            tracing::debug!(bytes = image.bytes.len(), content_type = %image.content_type, "Relaying image");
        }
        Err(err) => metrics::record_request(err.kind()),
    }

    relay::respond(outcome, &state.cors, declared)
}

/// The proxy pipeline. Each stage short-circuits on failure.
async fn proxy_image(state: &AppState, query: Option<&str>, headers: &HeaderMap) -> FetchOutcome {
    let origin = check_origin(headers, &state.allowlist).map_err(|err| {
        if let RelayError::Forbidden(reason) = &err {
            tracing::warn!(reason = reason.as_str(), "Rejected request origin");
            metrics::record_rejected(*reason);
        }
        err
    })?;

    let _permit = state.limit.try_acquire().map_err(|err| {
        tracing::warn!(
            origin = %origin,
            available = ?state.limit.available(),
            "Concurrent request ceiling reached"
        );
        err
    })?;

    let raw_url = query.and_then(|q| query_param(q, "url"));
    let target = upstream::validate(raw_url.as_deref()).map_err(|err| {
        tracing::debug!(origin = %origin, error = %err, "Rejected target URL");
        err
    })?;

    tracing::debug!(origin = %origin, url = %target.as_str(), "Fetching upstream image");
    state.fetcher.fetch(&target).await
}

/// First value of `name` in an `application/x-www-form-urlencoded` query string.
fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// `OPTIONS /`: CORS preflight, never gated.
async fn preflight_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let declared = declared_origin(&headers).and_then(|v| v.to_str().ok());
    state.cors.preflight(declared)
}
