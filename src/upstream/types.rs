//! Upstream record types and error definitions.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Opaque reservation record, passed to callers verbatim.
pub type Reservation = serde_json::Value;

/// Collections queried on the booking platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Coworkers,
    Bookings,
}

impl Endpoint {
    /// Path segment below the configured base URL.
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Coworkers => "coworkers",
            Endpoint::Bookings => "bookings",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal membership (coworker) id on the booking platform.
///
/// The platform serves ids as JSON numbers; strings are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MembershipId(pub String);

impl MembershipId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MembershipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MembershipId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => MembershipId(n.to_string()),
            RawId::Text(s) => MembershipId(s),
        })
    }
}

/// Membership record linked to an external user id.
#[derive(Debug, Clone, Deserialize)]
pub struct Membership {
    #[serde(rename = "Id")]
    pub id: MembershipId,

    #[serde(rename = "CoworkerContractTariffNames", default)]
    pub tariff_names: Option<String>,
}

impl Membership {
    /// Case-insensitive substring match on the tariff names.
    pub fn has_tariff(&self, marker: &str) -> bool {
        self.tariff_names
            .as_deref()
            .map(|names| names.to_lowercase().contains(&marker.to_lowercase()))
            .unwrap_or(false)
    }
}

/// Collection response envelope: `{ "Records": [...] }`.
#[derive(Debug, Deserialize)]
pub struct RecordsEnvelope<T> {
    #[serde(rename = "Records")]
    pub records: Vec<T>,
}

/// Errors that can occur while talking to the booking platform.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection or request failed before a response arrived.
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    /// Request exceeded the configured deadline.
    #[error("{endpoint} request timed out after {secs} seconds")]
    Timeout { endpoint: Endpoint, secs: u64 },

    /// Non-success HTTP status.
    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    /// Payload did not match the expected envelope.
    #[error("{endpoint} returned malformed payload: {reason}")]
    Decode { endpoint: Endpoint, reason: String },

    /// Client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Setup(#[source] reqwest::Error),
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_numeric_id() {
        let m: Membership = serde_json::from_str(
            r#"{"Id": 1234567, "CoworkerContractTariffNames": "Hot Desk", "FullName": "A"}"#,
        )
        .unwrap();
        assert_eq!(m.id.as_str(), "1234567");
        assert_eq!(m.tariff_names.as_deref(), Some("Hot Desk"));
    }

    #[test]
    fn test_membership_string_id_and_null_tariff() {
        let m: Membership =
            serde_json::from_str(r#"{"Id": "abc-1", "CoworkerContractTariffNames": null}"#).unwrap();
        assert_eq!(m.id.as_str(), "abc-1");
        assert!(m.tariff_names.is_none());
        assert!(!m.has_tariff("Dedicated Desk"));
    }

    #[test]
    fn test_has_tariff_is_case_insensitive_substring() {
        let m = Membership {
            id: MembershipId("1".into()),
            tariff_names: Some("Monthly DEDICATED desk, Meeting credits".into()),
        };
        assert!(m.has_tariff("Dedicated Desk"));
        assert!(!m.has_tariff("Private Office"));
    }

    #[test]
    fn test_envelope_requires_records() {
        let ok: RecordsEnvelope<Reservation> =
            serde_json::from_str(r#"{"Records": [{"Id": 1}], "TotalItems": 1}"#).unwrap();
        assert_eq!(ok.records.len(), 1);

        assert!(serde_json::from_str::<RecordsEnvelope<Reservation>>(r#"{"Items": []}"#).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = UpstreamError::Status {
            endpoint: Endpoint::Bookings,
            status: 401,
            body: "Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "bookings returned status 401: Unauthorized");

        let err = UpstreamError::Timeout {
            endpoint: Endpoint::Coworkers,
            secs: 10,
        };
        assert_eq!(err.to_string(), "coworkers request timed out after 10 seconds");
    }
}
