//! Response shaping and error mapping.
//!
//! # Responsibilities
//! - Map every failure class to its HTTP status and `{"error": ...}` body
//! - Keep upstream detail out of client responses (logged instead)
//! - Attach `Retry-After` to rate-limit rejections

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::security::GateError;
use crate::upstream::UpstreamError;

/// Message returned for any upstream failure.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to retrieve bookings.";

/// Every way a lookup request can fail.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("Too many requests, please try again later.")]
    RateLimited { retry_after: Duration },

    #[error("upstream failure: {0}")]
    Upstream(#[from] UpstreamError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Gate(GateError::MissingInput | GateError::InvalidFormat) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Gate(GateError::InvalidSignature) => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the caller.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Upstream(_) => UPSTREAM_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Upstream(ref e) = self {
            tracing::error!(error = %e, "Booking platform request failed");
        }

        let status = self.status();
        let body = Json(ErrorBody {
            error: self.public_message(),
        });
        let mut response = (status, body).into_response();

        if let ApiError::RateLimited { retry_after } = self {
            let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::Endpoint;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_gate_errors() {
        let cases = [
            (GateError::MissingInput, StatusCode::BAD_REQUEST, "Missing userid or hash parameter."),
            (GateError::InvalidFormat, StatusCode::BAD_REQUEST, "Invalid userid format."),
            (GateError::InvalidSignature, StatusCode::FORBIDDEN, "Invalid signature."),
        ];

        for (err, status, message) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
            assert_eq!(body_json(response).await, serde_json::json!({ "error": message }));
        }
    }

    #[tokio::test]
    async fn test_upstream_detail_is_hidden() {
        let err = ApiError::from(UpstreamError::Status {
            endpoint: Endpoint::Coworkers,
            status: 401,
            body: "Invalid credentials for api-user".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "error": UPSTREAM_FAILURE_MESSAGE }));
        assert!(!body.to_string().contains("credentials"));
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited {
            retry_after: Duration::from_millis(1500),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");

        let response = ApiError::RateLimited {
            retry_after: Duration::ZERO,
        }
        .into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }
}
