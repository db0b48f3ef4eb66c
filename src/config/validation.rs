//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sizes > 0, addresses parse)
//! - Check path patterns are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SourceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SourceConfig;
use crate::routing::PathPattern;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &SourceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if let Err(e) = PathPattern::parse(&config.http.path_pattern) {
        errors.push(ValidationError::new("http.path_pattern", e.to_string()));
    }

    if config.http.mapped_request_headers.iter().any(|p| p.trim().is_empty()) {
        errors.push(ValidationError::new(
            "http.mapped_request_headers",
            "patterns must not be blank",
        ));
    }

    let security = &config.security;
    if security.enabled && security.username.is_empty() {
        errors.push(ValidationError::new(
            "security.username",
            "must be set when security is enabled",
        ));
    }
    if security.username.contains(':') {
        errors.push(ValidationError::new(
            "security.username",
            "must not contain ':'",
        ));
    }
    for pattern in &security.exempt_paths {
        if let Err(e) = PathPattern::parse(pattern) {
            errors.push(ValidationError::new("security.exempt_paths", e.to_string()));
        }
    }
    if security.enabled
        && security.csrf_enabled
        && !is_literal_path(&security.csrf_token_path)
    {
        errors.push(ValidationError::new(
            "security.csrf_token_path",
            "must be a literal path below '/'",
        ));
    }
    if security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    if config.cors.allowed_origins.is_empty() {
        errors.push(ValidationError::new("cors.allowed_origins", "must not be empty"));
    }
    if config.cors.allowed_headers.is_empty() {
        errors.push(ValidationError::new("cors.allowed_headers", "must not be empty"));
    }

    if config.sink.capacity == 0 {
        errors.push(ValidationError::new("sink.capacity", "must be > 0"));
    }
    if config.sink.send_timeout_ms == 0 {
        errors.push(ValidationError::new("sink.send_timeout_ms", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `/a/b` style: leading slash, at least one segment, no pattern syntax.
fn is_literal_path(path: &str) -> bool {
    path.starts_with('/')
        && path.len() > 1
        && !path.contains(['*', '?', '{', '}'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SourceConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = SourceConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.http.path_pattern = "foo".into();
        config.cors.allowed_origins.clear();
        config.sink.capacity = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "http.path_pattern",
                "cors.allowed_origins",
                "sink.capacity",
            ]
        );
    }

    #[test]
    fn test_security_requires_username() {
        let mut config = SourceConfig::default();
        config.security.enabled = true;
        config.security.username.clear();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "security.username");
    }

    #[test]
    fn test_csrf_token_path_must_be_literal() {
        let mut config = SourceConfig::default();
        config.security.enabled = true;
        config.security.csrf_enabled = true;

        for bad in ["/", "csrf", "/csrf/{id}", "/tokens/*"] {
            config.security.csrf_token_path = bad.into();
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors[0].field, "security.csrf_token_path", "{bad}");
        }

        config.security.csrf_token_path = "/auth/csrf".into();
        assert!(validate_config(&config).is_ok());
    }
}
