//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use secrecy::SecretString;
use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Environment variables consulted after the file is read.
pub const ENV_PORT: &str = "PORT";
pub const ENV_UPSTREAM_USERNAME: &str = "NEXUDUS_API_USERNAME";
pub const ENV_UPSTREAM_PASSWORD: &str = "NEXUDUS_API_PASSWORD";
pub const ENV_UPSTREAM_BASE_URL: &str = "NEXUDUS_API_BASE_URL";
pub const ENV_SIGNING_SECRET: &str = "HMAC_SECRET";

/// Load configuration from an optional TOML file, apply process environment
/// overrides, and validate.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with_env<F>(path: Option<&Path>, env: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, env);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values onto a parsed configuration.
///
/// Empty values are ignored so an exported-but-blank variable does not wipe
/// a value from the file.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = get(ENV_PORT) {
        config.listener.bind_address = format!("0.0.0.0:{}", port.trim());
    }
    if let Some(username) = get(ENV_UPSTREAM_USERNAME) {
        config.upstream.username = username;
    }
    if let Some(password) = get(ENV_UPSTREAM_PASSWORD) {
        config.upstream.password = SecretString::new(password);
    }
    if let Some(base_url) = get(ENV_UPSTREAM_BASE_URL) {
        config.upstream.base_url = base_url;
    }
    if let Some(secret) = get(ENV_SIGNING_SECRET) {
        config.signing.secret = SecretString::new(secret);
    }
}
