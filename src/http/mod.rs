//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → security::rate_limit (per-client ceiling)
//!     → bookings.rs (signature gate, booking resolver)
//!     → response.rs (JSON body, error → status mapping)
//!     → Send to client
//! ```

pub mod bookings;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
