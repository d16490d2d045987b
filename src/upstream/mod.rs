//! Upstream booking platform integration.
//!
//! # Data Flow
//! ```text
//! BookingResolver
//!     → platform.rs (BookingPlatform trait, swappable in tests)
//!     → client.rs (NexudusClient: reqwest + basic auth + timeouts)
//!         GET {base}/coworkers?Coworker_User=<userid>
//!         GET {base}/bookings?Booking_Coworker=<id>&from_Booking_FromTime=..&to_Booking_ToTime=..&status=Confirmed
//!     → types.rs (Records envelope, Membership, UpstreamError)
//! ```
//!
//! # Design Decisions
//! - Read-only: only GET requests are issued
//! - No retries; a failed call fails the lookup
//! - Error bodies are kept for server-side logs only

pub mod client;
pub mod platform;
pub mod types;

pub use client::NexudusClient;
pub use platform::BookingPlatform;
pub use types::{Endpoint, Membership, MembershipId, Reservation, UpstreamError, UpstreamResult};
