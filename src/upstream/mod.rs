//! Upstream fetching subsystem.
//!
//! # Data Flow
//! ```text
//! raw `url` query parameter
//!     → target.rs (absolute http/https only)
//!     → fetcher.rs (GET with timeout, status + content-type check on headers)
//!     → body.rs (running byte count, abort past budget)
//!     → FetchedImage handed to the response relay
//! ```

pub mod body;
pub mod fetcher;
pub mod target;

pub use fetcher::{FetchOutcome, FetchedImage, Fetcher};
pub use target::{validate, ValidatedUrl};
