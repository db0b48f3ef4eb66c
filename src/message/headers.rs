//! Inbound header mapping.
//!
//! # Responsibilities
//! - Decide which request headers are copied onto the outbound message
//! - Expand the `HTTP_REQUEST_HEADERS` token to the standard header set
//! - Support `!pattern` negation
//!
//! # Design Decisions
//! - Patterns are case-insensitive, `*` is the only wildcard
//! - A negated match always wins over an inclusive one
//! - Content-Type is never copied raw; the message carries a canonical one

use std::collections::BTreeMap;

use axum::http::{header, HeaderMap};

use crate::config::HTTP_REQUEST_HEADERS;
use crate::routing::wildcard_match;

/// Standard HTTP request headers, lowercase.
pub const STANDARD_REQUEST_HEADERS: &[&str] = &[
    "accept",
    "accept-charset",
    "accept-encoding",
    "accept-language",
    "accept-ranges",
    "authorization",
    "cache-control",
    "connection",
    "content-length",
    "content-type",
    "cookie",
    "date",
    "expect",
    "from",
    "host",
    "if-match",
    "if-modified-since",
    "if-none-match",
    "if-range",
    "if-unmodified-since",
    "max-forwards",
    "pragma",
    "proxy-authorization",
    "range",
    "referer",
    "te",
    "upgrade",
    "user-agent",
    "via",
    "warning",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum NamePattern {
    Standard,
    Glob(String),
}

impl NamePattern {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case(HTTP_REQUEST_HEADERS) {
            NamePattern::Standard
        } else {
            NamePattern::Glob(raw.to_ascii_lowercase())
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Standard => STANDARD_REQUEST_HEADERS.contains(&name),
            NamePattern::Glob(glob) => wildcard_match(glob, name),
        }
    }
}

/// Selects request headers for the outbound message.
#[derive(Debug, Clone)]
pub struct HeaderMapper {
    include: Vec<NamePattern>,
    exclude: Vec<NamePattern>,
}

impl HeaderMapper {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            match pattern.strip_prefix('!') {
                Some(negated) => exclude.push(NamePattern::parse(negated)),
                None => include.push(NamePattern::parse(pattern)),
            }
        }
        Self { include, exclude }
    }

    /// Returns true if a header with this (lowercase) name is copied.
    pub fn should_map(&self, name: &str) -> bool {
        if self.exclude.iter().any(|p| p.matches(name)) {
            return false;
        }
        self.include.iter().any(|p| p.matches(name))
    }

    /// Copy the selected headers. Repeated headers are joined with ", ".
    pub fn map(&self, headers: &HeaderMap) -> BTreeMap<String, String> {
        let mut mapped = BTreeMap::new();

        for name in headers.keys() {
            if *name == header::CONTENT_TYPE || !self.should_map(name.as_str()) {
                continue;
            }
            let values: Vec<&str> = headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            if values.is_empty() {
                tracing::debug!(header = %name, "Skipping header with non-ASCII value");
                continue;
            }
            mapped.insert(name.as_str().to_string(), values.join(", "));
        }

        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn sample_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("*/*"));
        headers.insert("user-agent", HeaderValue::from_static("curl/8.0"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("foo", HeaderValue::from_static("bar"));
        headers.append("x-trace", HeaderValue::from_static("a"));
        headers.append("x-trace", HeaderValue::from_static("b"));
        headers
    }

    #[test]
    fn test_standard_set_excludes_custom_headers() {
        let mapper = HeaderMapper::new([HTTP_REQUEST_HEADERS]);
        let mapped = mapper.map(&sample_headers());

        assert_eq!(mapped.get("accept").map(String::as_str), Some("*/*"));
        assert_eq!(mapped.get("user-agent").map(String::as_str), Some("curl/8.0"));
        assert!(!mapped.contains_key("foo"));
        assert!(!mapped.contains_key("x-trace"));
        assert!(!mapped.contains_key("content-type"));
    }

    #[test]
    fn test_star_maps_everything_but_content_type() {
        let mapper = HeaderMapper::new(["*"]);
        let mapped = mapper.map(&sample_headers());

        assert_eq!(mapped.get("foo").map(String::as_str), Some("bar"));
        assert_eq!(mapped.get("x-trace").map(String::as_str), Some("a, b"));
        assert!(!mapped.contains_key("content-type"));
    }

    #[test]
    fn test_globs_and_negation() {
        let mapper = HeaderMapper::new(["X-*", "Accept", "!x-secret*"]);
        assert!(mapper.should_map("x-trace"));
        assert!(mapper.should_map("accept"));
        assert!(!mapper.should_map("x-secret-token"));
        assert!(!mapper.should_map("user-agent"));

        let mapper = HeaderMapper::new(["*", "!HTTP_REQUEST_HEADERS"]);
        assert!(mapper.should_map("foo"));
        assert!(!mapper.should_map("accept"));
    }
}
