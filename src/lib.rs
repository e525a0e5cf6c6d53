//! CORS image relay library.
//!
//! Fetches a remote image on behalf of a browser page and re-serves it with
//! origin-gated CORS headers.
//!
//! # Request pipeline
//!
//! ```text
//!  GET /?url=...                                                  upstream
//!  ──────────────▶ origin gate ─▶ admission ─▶ URL validator ─▶ fetcher ◀──▶ image host
//!                   (security)    (security)    (upstream)      (upstream)
//!                       │             │              │              │
//!                       └─────────────┴──────┬───────┴──────────────┘
//!                                            ▼
//!  ◀──────────────────────────────── response relay + CORS composer (http)
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
