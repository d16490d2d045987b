//! Booking resolution subsystem.
//!
//! # Data Flow
//! ```text
//! authenticated UserId
//!     → resolver.rs: coworkers lookup
//!         no record        → { "bookings": [] }
//!         dedicated tariff → { "dedicatedMember": true }
//!     → window.rs: local midnight .. 23:59:59.999 as UTC
//!     → resolver.rs: confirmed bookings in window → { "bookings": [...] }
//! ```

pub mod resolver;
pub mod window;

pub use resolver::{BookingResolver, LookupOutcome};
pub use window::DayWindow;
