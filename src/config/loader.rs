//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, UpstreamTarget};
use crate::config::validation::{validate_config, ValidationError};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "GATEWAY_";

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

/// Load, override from the process environment, and validate a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, std::env::vars());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build a configuration from defaults and the process environment only.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    let mut config = GatewayConfig::default();
    apply_env_overrides(&mut config, std::env::vars());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse TOML text without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply `GATEWAY_*` overrides on top of a parsed configuration.
///
/// Recognized variables:
/// - `GATEWAY_BIND_ADDRESS`
/// - `GATEWAY_LOG_LEVEL`
/// - `GATEWAY_POSTING_URL`
/// - `GATEWAY_UPSTREAM_<OPERATION>_URL`, e.g. `GATEWAY_UPSTREAM_SEND_BLAST_URL`
///
/// An upstream override replaces only the URL; headers from the file stay.
pub fn apply_env_overrides<I>(config: &mut GatewayConfig, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(name) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };

        match name {
            "BIND_ADDRESS" => config.listener.bind_address = value,
            "LOG_LEVEL" => config.observability.log_level = value,
            "POSTING_URL" => config.posting.url = value,
            _ => {
                let Some(operation) = name
                    .strip_prefix("UPSTREAM_")
                    .and_then(|rest| rest.strip_suffix("_URL"))
                else {
                    continue;
                };
                let operation = operation.to_ascii_lowercase();
                tracing::debug!(operation = %operation, "Upstream URL overridden from environment");
                config
                    .upstreams
                    .entry(operation)
                    .and_modify(|target| target.url = value.clone())
                    .or_insert_with(|| UpstreamTarget::new(value));
            }
        }
    }
}
