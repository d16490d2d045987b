//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required credentials and secrets are present
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// Sequential upstream calls a single lookup can make.
const UPSTREAM_CALLS_PER_LOOKUP: u64 = 2;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a fully-merged configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::invalid("listener.bind_address", e.to_string()));
    }

    match url::Url::parse(&config.upstream.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::invalid(
            "upstream.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::invalid("upstream.base_url", e.to_string())),
    }

    if config.upstream.username.is_empty() {
        errors.push(ValidationError::Missing("upstream.username"));
    }
    if config.upstream.password.expose_secret().is_empty() {
        errors.push(ValidationError::Missing("upstream.password"));
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::invalid("upstream.timeout_secs", "must be greater than 0"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::invalid(
            "upstream.connect_timeout_secs",
            "must be greater than 0",
        ));
    }

    if config.signing.secret.expose_secret().is_empty() {
        errors.push(ValidationError::Missing("signing.secret"));
    }
    if config.signing.dedicated_marker.trim().is_empty() {
        errors.push(ValidationError::Missing("signing.dedicated_marker"));
    }

    // The request timeout must outlive every upstream call of one lookup.
    let upstream_budget = config
        .upstream
        .timeout_secs
        .saturating_mul(UPSTREAM_CALLS_PER_LOOKUP);
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::invalid("timeouts.request_secs", "must be greater than 0"));
    } else if config.timeouts.request_secs <= upstream_budget {
        errors.push(ValidationError::invalid(
            "timeouts.request_secs",
            format!(
                "must exceed {}s ({} x upstream.timeout_secs)",
                upstream_budget, UPSTREAM_CALLS_PER_LOOKUP
            ),
        ));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::invalid("rate_limit.max_requests", "must be greater than 0"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::invalid("rate_limit.window_secs", "must be greater than 0"));
        }
    }

    for origin in &config.cors.allowed_origins {
        if origin.trim() == "*" {
            errors.push(ValidationError::invalid(
                "cors.allowed_origins",
                "'*' is not allowed in a list, leave the list empty to allow any origin",
            ));
        } else if HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::invalid(
                "cors.allowed_origins",
                format!("'{}' is not a valid header value", origin),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::invalid(
            "observability.metrics_address",
            "not a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
