//! The booking platform seen from the resolver.

use async_trait::async_trait;

use crate::bookings::window::DayWindow;
use crate::security::UserId;
use crate::upstream::types::{Membership, MembershipId, Reservation, UpstreamResult};

/// Read-only operations the resolver needs from the booking platform.
#[async_trait]
pub trait BookingPlatform: Send + Sync {
    /// Find the membership linked to an external user id, if any.
    async fn resolve_membership(&self, user_id: &UserId) -> UpstreamResult<Option<Membership>>;

    /// Confirmed reservations of a membership inside the window.
    async fn list_confirmed_bookings(
        &self,
        membership_id: &MembershipId,
        window: &DayWindow,
    ) -> UpstreamResult<Vec<Reservation>>;
}
