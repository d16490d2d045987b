//! Nexudus REST client with timeout and error handling.
//!
//! # Responsibilities
//! - Query the `coworkers` and `bookings` collections with basic auth
//! - Enforce connect and total timeouts on every call
//! - Turn transport failures, bad statuses and bad payloads into `UpstreamError`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::bookings::window::DayWindow;
use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::security::UserId;
use crate::upstream::platform::BookingPlatform;
use crate::upstream::types::{
    Endpoint, Membership, MembershipId, RecordsEnvelope, Reservation, UpstreamError,
    UpstreamResult,
};

/// Upper bound on how much of an error body is kept for logs.
const MAX_ERROR_BODY_CHARS: usize = 2048;

/// Only confirmed reservations are returned to callers.
const CONFIRMED_STATUS: &str = "Confirmed";

/// Booking platform client backed by reqwest.
#[derive(Clone)]
pub struct NexudusClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: SecretString,
    timeout: Duration,
}

impl NexudusClient {
    /// Create a new client from validated configuration.
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("bookings-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(UpstreamError::Setup)?;

        tracing::info!(
            base_url = %config.base_url,
            timeout_secs = config.timeout_secs,
            "Booking platform client initialized"
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            timeout,
        })
    }

    fn collection_url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.as_str())
    }

    /// GET a collection and unwrap its `Records`.
    async fn fetch_records<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
    ) -> UpstreamResult<Vec<T>> {
        let start = Instant::now();
        let result = self.fetch_records_inner(endpoint, query).await;
        metrics::record_upstream_call(endpoint.as_str(), result.is_ok(), start);
        result
    }

    async fn fetch_records_inner<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
    ) -> UpstreamResult<Vec<T>> {
        let response = self
            .http
            .get(self.collection_url(endpoint))
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                endpoint,
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let envelope: RecordsEnvelope<T> =
            serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode {
                endpoint,
                reason: e.to_string(),
            })?;

        tracing::debug!(endpoint = %endpoint, records = envelope.records.len(), "Upstream records fetched");
        Ok(envelope.records)
    }

    fn transport_error(&self, endpoint: Endpoint, e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Timeout {
                endpoint,
                secs: self.timeout.as_secs(),
            }
        } else {
            UpstreamError::Transport {
                endpoint,
                source: e,
            }
        }
    }
}

#[async_trait]
impl BookingPlatform for NexudusClient {
    async fn resolve_membership(&self, user_id: &UserId) -> UpstreamResult<Option<Membership>> {
        let records: Vec<Membership> = self
            .fetch_records(Endpoint::Coworkers, &[("Coworker_User", user_id.as_str())])
            .await?;

        if records.len() > 1 {
            tracing::warn!(
                user_id = %user_id,
                matches = records.len(),
                "Several memberships linked to one user, using the first"
            );
        }

        Ok(records.into_iter().next())
    }

    async fn list_confirmed_bookings(
        &self,
        membership_id: &MembershipId,
        window: &DayWindow,
    ) -> UpstreamResult<Vec<Reservation>> {
        let from = window.start_param();
        let to = window.end_param();

        self.fetch_records(
            Endpoint::Bookings,
            &[
                ("Booking_Coworker", membership_id.as_str()),
                ("from_Booking_FromTime", from.as_str()),
                ("to_Booking_ToTime", to.as_str()),
                ("status", CONFIRMED_STATUS),
            ],
        )
        .await
    }
}

impl std::fmt::Debug for NexudusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NexudusClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("timeout_secs", &self.timeout.as_secs())
            .finish()
    }
}

fn truncate(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
