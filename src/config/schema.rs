//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the source.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Pattern token that expands to the standard HTTP request header names.
pub const HTTP_REQUEST_HEADERS: &str = "HTTP_REQUEST_HEADERS";

/// Root configuration for the HTTP source.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SourceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Ingress endpoint settings (path, header mapping).
    pub http: IngressConfig,

    /// Authentication gate.
    pub security: SecurityConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Outbound channel settings.
    pub sink: SinkConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Ingress endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngressConfig {
    /// Ant-style path pattern the endpoint listens on.
    pub path_pattern: String,

    /// Header name patterns copied onto outbound messages.
    pub mapped_request_headers: Vec<String>,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            path_pattern: "/".to_string(),
            mapped_request_headers: vec![HTTP_REQUEST_HEADERS.to_string()],
        }
    }
}

/// Authentication gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Require basic authentication.
    pub enabled: bool,

    /// Require a CSRF token on state-changing requests (only with `enabled`).
    pub csrf_enabled: bool,

    /// Basic auth user name.
    pub username: String,

    /// Basic auth password. Empty means a random one is generated at startup.
    pub password: String,

    /// Path patterns that bypass the gate entirely.
    pub exempt_paths: Vec<String>,

    /// Key for CSRF token signatures. Empty means random per process.
    pub csrf_secret: String,

    /// Path of the CSRF token endpoint.
    pub csrf_token_path: String,

    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            csrf_enabled: false,
            username: "user".to_string(),
            password: String::new(),
            exempt_paths: Vec::new(),
            csrf_secret: String::new(),
            csrf_token_path: "/csrf".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origin patterns, e.g. "https://*.example.com".
    pub allowed_origins: Vec<String>,

    /// Request headers a cross-origin request may carry.
    pub allowed_headers: Vec<String>,

    /// Whether credentialed cross-origin requests are permitted.
    /// Unset means the credentials header is never sent.
    pub allow_credentials: Option<bool>,

    /// Pre-flight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_headers: vec!["*".to_string()],
            allow_credentials: None,
            max_age_secs: 1800,
        }
    }
}

/// Outbound channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Number of messages buffered before senders wait.
    pub capacity: usize,

    /// Maximum time a request waits for room in the channel, in milliseconds.
    pub send_timeout_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            send_timeout_ms: 5000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: SourceConfig = toml::from_str("").unwrap();
        assert_eq!(config.http.path_pattern, "/");
        assert_eq!(config.http.mapped_request_headers, vec![HTTP_REQUEST_HEADERS]);
        assert!(!config.security.enabled);
        assert_eq!(config.cors.allowed_origins, vec!["*"]);
        assert_eq!(config.cors.allow_credentials, None);
    }

    #[test]
    fn test_partial_sections() {
        let config: SourceConfig = toml::from_str(
            r#"
            [http]
            path_pattern = "/foo"

            [security]
            enabled = true
            csrf_enabled = true

            [cors]
            allowed_origins = ["/bar"]
            allow_credentials = true

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.http.path_pattern, "/foo");
        assert_eq!(config.http.mapped_request_headers, vec![HTTP_REQUEST_HEADERS]);
        assert!(config.security.csrf_enabled);
        assert_eq!(config.security.username, "user");
        assert_eq!(config.cors.allowed_headers, vec!["*"]);
        assert_eq!(config.cors.allow_credentials, Some(true));
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
