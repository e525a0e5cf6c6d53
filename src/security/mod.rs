//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming proxy request:
//!     → limits.rs (admit or 503)
//!     → origin.rs (Origin/Referer checked against allowlist.rs)
//!     → Pass to URL validation
//! ```
//!
//! # Design Decisions
//! - Fail closed: an empty allowlist forbids every proxied request
//! - Rejection happens before any upstream work
//! - Preflight is never gated

pub mod allowlist;
pub mod limits;
pub mod origin;

pub use allowlist::OriginAllowlist;
pub use limits::ConcurrencyLimit;
pub use origin::{check_origin, declared_origin};
