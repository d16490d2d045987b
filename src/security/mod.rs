//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-client fixed window, 429 when exceeded)
//!     → signature.rs (userid/hash presence, format, HMAC check)
//!     → Booking resolver
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Rate limiting runs before signature checks
//! - Malformed input (400) is distinct from a bad signature (403)

pub mod rate_limit;
pub mod signature;

pub use rate_limit::{rate_limit_middleware, RateLimiter};
pub use signature::{GateError, LookupParams, SignatureGate, UserId};
