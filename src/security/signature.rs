//! Request signature verification.
//!
//! Callers identify a user with `userid` and prove they hold the shared
//! secret with `hash`:
//!
//! ```text
//! hash = lowercase_hex(HMAC_SHA256(secret, trim(userid)))
//! ```
//!
//! Nothing else (path, other query parameters, timestamps) is signed.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Rejections produced before any upstream work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Missing userid or hash parameter.")]
    MissingInput,

    #[error("Invalid userid format.")]
    InvalidFormat,

    #[error("Invalid signature.")]
    InvalidSignature,
}

/// Raw query parameters of a lookup request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupParams {
    pub userid: Option<String>,
    pub hash: Option<String>,
}

/// An external user id that passed format validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Accepts one or more ASCII digits and nothing else.
    pub fn parse(raw: &str) -> Result<Self, GateError> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(GateError::InvalidFormat)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validates lookup requests against the shared secret.
pub struct SignatureGate {
    secret: SecretString,
}

impl SignatureGate {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Compute the expected signature for a user id.
    pub fn sign(&self, user_id: &str) -> String {
        // HMAC hashes over-long keys and pads short ones, so no key length is rejected.
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(user_id.trim().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Run the full gate: presence, format, then authenticity.
    pub fn verify(&self, params: &LookupParams) -> Result<UserId, GateError> {
        let raw_user = non_empty(params.userid.as_deref()).ok_or(GateError::MissingInput)?;
        let supplied = non_empty(params.hash.as_deref()).ok_or(GateError::MissingInput)?;

        let user_id = UserId::parse(raw_user)?;
        let expected = self.sign(user_id.as_str());
        let matched: bool = expected.as_bytes().ct_eq(supplied.as_bytes()).into();

        tracing::debug!(
            user_id = %user_id,
            supplied_hash = %supplied,
            computed_hash = %expected,
            matched,
            "Signature check"
        );

        if matched {
            Ok(user_id)
        } else {
            Err(GateError::InvalidSignature)
        }
    }
}

impl std::fmt::Debug for SignatureGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureGate").finish_non_exhaustive()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
