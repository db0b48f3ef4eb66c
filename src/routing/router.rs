//! Ingress route resolution.
//!
//! The source exposes a single route: POST on the configured path pattern.
//! Resolution distinguishes an unknown path from a known path hit with the
//! wrong method so the caller can answer 404 or 405.

use axum::http::Method;

use crate::routing::matcher::{PathPattern, PatternError};

/// Outcome of resolving a request against the ingress route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    Matched,
    MethodNotAllowed,
    NotFound,
}

/// The ingress route: a path pattern accepting POST only.
#[derive(Debug, Clone)]
pub struct IngressRoute {
    pattern: PathPattern,
}

impl IngressRoute {
    pub fn new(pattern: PathPattern) -> Self {
        Self { pattern }
    }

    pub fn from_config(path_pattern: &str) -> Result<Self, PatternError> {
        Ok(Self::new(PathPattern::parse(path_pattern)?))
    }

    /// Resolve a request method and path.
    pub fn resolve(&self, method: &Method, path: &str) -> RouteMatch {
        if !self.pattern.matches(path) {
            RouteMatch::NotFound
        } else if method == Method::POST {
            RouteMatch::Matched
        } else {
            RouteMatch::MethodNotAllowed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let route = IngressRoute::from_config("/foo").unwrap();
        assert_eq!(route.resolve(&Method::POST, "/foo"), RouteMatch::Matched);
        assert_eq!(route.resolve(&Method::GET, "/foo"), RouteMatch::MethodNotAllowed);
        assert_eq!(route.resolve(&Method::PUT, "/foo/"), RouteMatch::MethodNotAllowed);
        assert_eq!(route.resolve(&Method::POST, "/bar"), RouteMatch::NotFound);
    }
}
