//! CORS enforcement.
//!
//! Unlike a permissive header-only layer, a disallowed origin is rejected
//! outright with 403 and nothing reaches the handler. Pre-flights are
//! answered here and never reach the security gate; a pre-flight for a path
//! outside the ingress pattern is a 404.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::config::CorsConfig;
use crate::http::response::IngressError;
use crate::routing::{wildcard_match_ignore_case, IngressRoute, RouteMatch};

/// The only method advertised in pre-flight responses.
const ALLOWED_METHOD: &str = "POST";

const VARY_PREFLIGHT: &str = "Origin, Access-Control-Request-Method, Access-Control-Request-Headers";

/// Compiled CORS settings.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    allowed_headers: Vec<String>,
    allow_credentials: bool,
    max_age_secs: u64,
    route: IngressRoute,
}

impl CorsPolicy {
    /// Pre-flights are only answered for paths `route` accepts.
    pub fn from_config(config: &CorsConfig, route: IngressRoute) -> Self {
        Self {
            allowed_origins: config.allowed_origins.iter().map(|o| o.trim().to_string()).collect(),
            allowed_headers: config.allowed_headers.iter().map(|h| h.trim().to_string()).collect(),
            allow_credentials: config.allow_credentials.unwrap_or(false),
            max_age_secs: config.max_age_secs,
            route,
        }
    }

    fn any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` when the origin is
    /// not allowed.
    pub fn allow_origin(&self, origin: &str) -> Option<HeaderValue> {
        if self.any_origin() {
            if self.allow_credentials {
                return HeaderValue::from_str(origin).ok();
            }
            return Some(HeaderValue::from_static("*"));
        }
        self.allowed_origins
            .iter()
            .any(|pattern| wildcard_match_ignore_case(pattern, origin))
            .then(|| HeaderValue::from_str(origin).ok())
            .flatten()
    }

    /// Check the comma-separated `Access-Control-Request-Headers` value.
    /// Returns the requested names when every one of them is allowed.
    pub fn allow_headers(&self, requested: Option<&str>) -> Option<Vec<String>> {
        let requested: Vec<String> = requested
            .unwrap_or_default()
            .split(',')
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        let all_allowed = requested.iter().all(|name| {
            self.allowed_headers
                .iter()
                .any(|pattern| wildcard_match_ignore_case(pattern, name))
        });
        all_allowed.then_some(requested)
    }

    fn preflight_response(&self, allow_origin: HeaderValue, allowed_headers: &[String]) -> Response {
        let mut response = StatusCode::OK.into_response();
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHOD),
        );
        if !allowed_headers.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&allowed_headers.join(", ")) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
            }
        }
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(self.max_age_secs));
        if self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.insert(header::VARY, HeaderValue::from_static(VARY_PREFLIGHT));
        response
    }

    fn decorate(&self, response: &mut Response, allow_origin: HeaderValue) {
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        if self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
}

/// An `Origin` equal to the request's own scheme and host is not cross-origin.
fn is_same_origin(origin: &str, headers: &HeaderMap) -> bool {
    let Some(host) = headers.get(header::HOST).and_then(|h| h.to_str().ok()) else {
        return false;
    };
    let origin = origin.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();
    origin == format!("http://{host}") || origin == format!("https://{host}")
}

fn is_preflight(request: &Request<Body>) -> bool {
    request.method() == Method::OPTIONS
        && request.headers().contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Axum middleware enforcing the CORS policy.
pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(origin) = request.headers().get(header::ORIGIN) else {
        return next.run(request).await;
    };
    let Ok(origin) = origin.to_str().map(str::to_owned) else {
        warn!("Rejecting CORS request with non-ASCII origin");
        return IngressError::InvalidCors.into_response();
    };
    if is_same_origin(&origin, request.headers()) {
        return next.run(request).await;
    }

    let Some(allow_origin) = policy.allow_origin(&origin) else {
        warn!(origin = %origin, "Rejecting CORS request from disallowed origin");
        return IngressError::InvalidCors.into_response();
    };

    if is_preflight(&request) {
        let path = request.uri().path();
        if policy.route.resolve(&Method::POST, path) == RouteMatch::NotFound {
            debug!(origin = %origin, path = %path, "Pre-flight for unknown path");
            return IngressError::NotFound(path.to_string()).into_response();
        }

        let headers = request.headers();
        let method_ok = headers
            .get(header::ACCESS_CONTROL_REQUEST_METHOD)
            .and_then(|m| m.to_str().ok())
            .is_some_and(|m| m.trim() == ALLOWED_METHOD);
        let requested_headers = headers
            .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
            .and_then(|h| h.to_str().ok());

        return match (method_ok, policy.allow_headers(requested_headers)) {
            (true, Some(allowed)) => {
                debug!(origin = %origin, "Answering CORS pre-flight");
                policy.preflight_response(allow_origin, &allowed)
            }
            _ => {
                warn!(origin = %origin, "Rejecting CORS pre-flight");
                IngressError::InvalidCors.into_response()
            }
        };
    }

    let mut response = next.run(request).await;
    policy.decorate(&mut response, allow_origin);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(origins: &[&str], headers: &[&str], credentials: Option<bool>) -> CorsPolicy {
        let config = CorsConfig {
            allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
            allowed_headers: headers.iter().map(|s| s.to_string()).collect(),
            allow_credentials: credentials,
            max_age_secs: 60,
        };
        CorsPolicy::from_config(&config, IngressRoute::from_config("/").unwrap())
    }

    #[test]
    fn test_any_origin() {
        let p = policy(&["*"], &["*"], None);
        assert_eq!(p.allow_origin("https://a.example"), Some(HeaderValue::from_static("*")));

        let p = policy(&["*"], &["*"], Some(true));
        assert_eq!(
            p.allow_origin("https://a.example"),
            Some(HeaderValue::from_static("https://a.example"))
        );
    }

    #[test]
    fn test_restricted_origins() {
        let p = policy(&["/bar", "https://*.example.com"], &["*"], None);
        assert_eq!(p.allow_origin("/bar"), Some(HeaderValue::from_static("/bar")));
        assert!(p.allow_origin("https://app.example.com").is_some());
        assert!(p.allow_origin("/junk").is_none());
        assert!(p.allow_origin("https://example.org").is_none());
    }

    #[test]
    fn test_allowed_headers() {
        let p = policy(&["*"], &["content-type", "x-*"], None);
        assert_eq!(
            p.allow_headers(Some("Content-Type, X-Trace")),
            Some(vec!["content-type".to_string(), "x-trace".to_string()])
        );
        assert_eq!(p.allow_headers(None), Some(vec![]));
        assert_eq!(p.allow_headers(Some("authorization")), None);
    }

    #[test]
    fn test_same_origin() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:8080"));
        assert!(is_same_origin("http://localhost:8080", &headers));
        assert!(!is_same_origin("http://evil.example", &headers));
        assert!(!is_same_origin("http://localhost:8080", &HeaderMap::new()));
    }
}
