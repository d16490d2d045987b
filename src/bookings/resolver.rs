//! Two-step booking lookup: membership, then today's confirmed reservations.

use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::bookings::window::DayWindow;
use crate::security::UserId;
use crate::upstream::{BookingPlatform, Reservation, UpstreamResult};

/// What a successful lookup produced. Never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LookupOutcome {
    /// Today's confirmed reservations, possibly empty.
    Bookings { bookings: Vec<Reservation> },

    /// Dedicated members are not looked up further.
    Dedicated {
        #[serde(rename = "dedicatedMember")]
        dedicated_member: bool,
    },
}

impl LookupOutcome {
    pub fn bookings(bookings: Vec<Reservation>) -> Self {
        Self::Bookings { bookings }
    }

    pub fn dedicated() -> Self {
        Self::Dedicated {
            dedicated_member: true,
        }
    }
}

/// Resolves an authenticated user to the response payload.
pub struct BookingResolver {
    platform: Arc<dyn BookingPlatform>,
    dedicated_marker: String,
}

impl BookingResolver {
    pub fn new(platform: Arc<dyn BookingPlatform>, dedicated_marker: impl Into<String>) -> Self {
        Self {
            platform,
            dedicated_marker: dedicated_marker.into(),
        }
    }

    /// Look up reservations for the server's current local day.
    pub async fn resolve(&self, user_id: &UserId) -> UpstreamResult<LookupOutcome> {
        self.resolve_for_window(user_id, DayWindow::today).await
    }

    /// Look up reservations for the local day containing `now`.
    pub async fn resolve_at<Tz: TimeZone>(
        &self,
        user_id: &UserId,
        now: &DateTime<Tz>,
    ) -> UpstreamResult<LookupOutcome> {
        let window = DayWindow::containing(now);
        self.resolve_for_window(user_id, move || window).await
    }

    async fn resolve_for_window<F>(&self, user_id: &UserId, window: F) -> UpstreamResult<LookupOutcome>
    where
        F: FnOnce() -> DayWindow,
    {
        let membership = match self.platform.resolve_membership(user_id).await? {
            Some(m) => m,
            None => {
                tracing::info!(user_id = %user_id, "No membership linked to user");
                return Ok(LookupOutcome::bookings(Vec::new()));
            }
        };

        if membership.has_tariff(&self.dedicated_marker) {
            tracing::info!(
                user_id = %user_id,
                membership_id = %membership.id,
                "Dedicated membership, skipping reservation lookup"
            );
            return Ok(LookupOutcome::dedicated());
        }

        let window = window();
        tracing::debug!(
            membership_id = %membership.id,
            from = %window.start_param(),
            to = %window.end_param(),
            "Querying confirmed reservations"
        );

        let bookings = self
            .platform
            .list_confirmed_bookings(&membership.id, &window)
            .await?;

        tracing::info!(
            user_id = %user_id,
            membership_id = %membership.id,
            count = bookings.len(),
            "Reservations resolved"
        );
        Ok(LookupOutcome::bookings(bookings))
    }
}

impl std::fmt::Debug for BookingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingResolver")
            .field("dedicated_marker", &self.dedicated_marker)
            .finish_non_exhaustive()
    }
}
