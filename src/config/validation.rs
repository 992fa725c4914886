//! Configuration validation.
//!
//! Serde handles syntax; this module checks meaning:
//! - every registered operation has an upstream, and no upstream names an
//!   unknown operation
//! - upstream and posting URLs are absolute http(s) URLs
//! - header names and values are valid HTTP tokens
//! - timeouts are non-zero and the request deadline outlasts the upstream one
//! - addresses parse
//!
//! All errors are collected, not just the first.

use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::gateway::OperationRegistry;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration against the built-in operation registry.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let registry = OperationRegistry::builtin();
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.upstream_secs", timeouts.upstream_secs),
        ("timeouts.request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if timeouts.upstream_secs > 0 && timeouts.request_secs <= timeouts.upstream_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must be greater than timeouts.upstream_secs ({})",
                timeouts.upstream_secs
            ),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than zero"));
    }

    for operation in registry.iter() {
        if !config.upstreams.contains_key(operation.name) {
            errors.push(ValidationError::new(
                format!("upstreams.{}", operation.name),
                "no upstream configured for operation",
            ));
        }
    }

    for (name, target) in &config.upstreams {
        let field = format!("upstreams.{name}");
        if registry.get(name).is_none() {
            errors.push(ValidationError::new(&field, "unknown operation"));
            continue;
        }
        if let Err(message) = check_http_url(&target.url) {
            errors.push(ValidationError::new(format!("{field}.url"), message));
        }
        for (header, value) in &target.headers {
            if HeaderName::from_bytes(header.as_bytes()).is_err() {
                errors.push(ValidationError::new(
                    format!("{field}.headers"),
                    format!("'{header}' is not a valid header name"),
                ));
            } else if HeaderValue::from_str(value).is_err() {
                errors.push(ValidationError::new(
                    format!("{field}.headers.{header}"),
                    "not a valid header value",
                ));
            }
        }
    }

    if let Err(message) = check_http_url(&config.posting.url) {
        errors.push(ValidationError::new("posting.url", message));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse `raw` and require an absolute http or https URL with a host.
pub(crate) fn check_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("'{raw}' is not a valid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        "http" | "https" => Err(format!("'{raw}' has no host")),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::UpstreamTarget;

    fn complete_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        for operation in OperationRegistry::builtin().iter() {
            config.upstreams.insert(
                operation.name.to_string(),
                UpstreamTarget::new(format!("http://127.0.0.1:5000/{}", operation.name)),
            );
        }
        config
    }

    #[test]
    fn test_complete_config_is_valid() {
        assert_eq!(validate_config(&complete_config()), Ok(()));
    }

    #[test]
    fn test_missing_upstream_is_reported() {
        let mut config = complete_config();
        config.upstreams.remove("send_blast");

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "upstreams.send_blast");
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = complete_config();
        config.timeouts.connect_secs = 0;
        config.posting.url = "ftp://example.com/upload".into();
        config.upstreams.insert("fetch_analytics".into(), UpstreamTarget::new("not a url"));
        config
            .upstreams
            .insert("delete_everything".into(), UpstreamTarget::new("http://localhost"));

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"timeouts.connect_secs"));
        assert!(fields.contains(&"posting.url"));
        assert!(fields.contains(&"upstreams.fetch_analytics.url"));
        assert!(fields.contains(&"upstreams.delete_everything"));
    }

    #[test]
    fn test_rejects_bad_header_name() {
        let mut config = complete_config();
        let target = UpstreamTarget::new("https://tunnel.example.com/analytics")
            .with_header("bad header", "true");
        config.upstreams.insert("fetch_analytics".into(), target);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "upstreams.fetch_analytics.headers");
    }

    #[test]
    fn test_request_deadline_must_outlast_upstream_timeout() {
        let mut config = complete_config();
        config.timeouts.request_secs = 1;
        config.timeouts.upstream_secs = 30;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");

        config.timeouts.request_secs = 30;
        assert!(validate_config(&config).is_err());

        config.timeouts.request_secs = 31;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_check_http_url() {
        assert!(check_http_url("https://abc.ngrok-free.app/api").is_ok());
        assert!(check_http_url("mailto:someone@example.com").is_err());
        assert!(check_http_url("/relative/path").is_err());
    }
}
