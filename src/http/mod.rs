//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span)
//!     → OPTIONS /  → cors.rs preflight (204)
//!     → GET /health → health.rs
//!     → GET /?url= → security (origin gate, admission)
//!                  → upstream (validate, fetch)
//!                  → relay.rs (image or JSON error, CORS headers via cors.rs)
//!     → Send to client
//! ```

pub mod cors;
pub mod health;
pub mod relay;
pub mod request;
pub mod server;

pub use cors::CorsPolicy;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
