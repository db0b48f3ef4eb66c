//! Authentication gate.
//!
//! The gate runs in one of three modes fixed at startup. All decisions go
//! through [`authorize`], a pure function of the request and the policy;
//! [`security_middleware`] only applies its verdict.

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::http::response::IngressError;
use crate::routing::{PathPattern, PatternError};
use crate::security::csrf::{CsrfTokens, CSRF_HEADER};

/// Gate mode, derived once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    Disabled,
    Enabled,
    EnabledWithCsrf,
}

impl SecurityMode {
    pub fn from_config(config: &SecurityConfig) -> Self {
        match (config.enabled, config.csrf_enabled) {
            (false, _) => SecurityMode::Disabled,
            (true, false) => SecurityMode::Enabled,
            (true, true) => SecurityMode::EnabledWithCsrf,
        }
    }
}

/// The authenticated user, attached to request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingCredentials,
    BadCredentials,
    MissingCsrfToken,
    InvalidCsrfToken,
}

impl AuthFailure {
    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::MissingCredentials => {
                "Full authentication is required to access this resource"
            }
            AuthFailure::BadCredentials => "Bad credentials",
            AuthFailure::MissingCsrfToken => "Missing CSRF token",
            AuthFailure::InvalidCsrfToken => "Invalid CSRF token",
        }
    }
}

/// Verdict of [`authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// Let the request through, with the user when one was authenticated.
    Allow(Option<Principal>),
    Deny(AuthFailure),
}

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the gate needs, built once at startup.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    mode: SecurityMode,
    credentials: Credentials,
    exempt_paths: Vec<PathPattern>,
    csrf: Option<CsrfTokens>,
}

impl SecurityPolicy {
    /// Build the policy. When security is on and no password is configured,
    /// a random one is generated and logged once.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, PatternError> {
        let mode = SecurityMode::from_config(config);

        let password = if config.password.is_empty() && mode != SecurityMode::Disabled {
            let generated = Uuid::new_v4().to_string();
            warn!(
                username = %config.username,
                "Using generated security password: {}",
                generated
            );
            generated
        } else {
            config.password.clone()
        };

        let exempt_paths = config
            .exempt_paths
            .iter()
            .map(|p| PathPattern::parse(p))
            .collect::<Result<Vec<_>, _>>()?;

        let csrf = (mode == SecurityMode::EnabledWithCsrf)
            .then(|| CsrfTokens::from_secret(&config.csrf_secret));

        Ok(Self {
            mode,
            credentials: Credentials {
                username: config.username.clone(),
                password,
            },
            exempt_paths,
            csrf,
        })
    }

    pub fn mode(&self) -> SecurityMode {
        self.mode
    }

    /// Token issuer, present only in CSRF mode.
    pub fn csrf(&self) -> Option<&CsrfTokens> {
        self.csrf.as_ref()
    }

    fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| p.matches(path))
    }

    fn check_credentials(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(username.as_bytes(), self.credentials.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.credentials.password.as_bytes());
        user_ok & pass_ok
    }
}

/// Decide whether a request may pass the gate.
pub fn authorize(
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    policy: &SecurityPolicy,
) -> AuthDecision {
    if policy.mode == SecurityMode::Disabled || policy.is_exempt(path) {
        return AuthDecision::Allow(None);
    }

    let Some((username, password)) = basic_credentials(headers) else {
        return AuthDecision::Deny(AuthFailure::MissingCredentials);
    };
    if !policy.check_credentials(&username, &password) {
        return AuthDecision::Deny(AuthFailure::BadCredentials);
    }

    if let Some(csrf) = policy.csrf.as_ref().filter(|_| requires_csrf(method)) {
        let token = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
        match token {
            None => return AuthDecision::Deny(AuthFailure::MissingCsrfToken),
            Some(token) if !csrf.verify(&username, token) => {
                return AuthDecision::Deny(AuthFailure::InvalidCsrfToken);
            }
            Some(_) => {}
        }
    }

    AuthDecision::Allow(Some(Principal { name: username }))
}

/// Safe methods never need a CSRF token.
fn requires_csrf(method: &Method) -> bool {
    !matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Extract `user:password` from a `Basic` Authorization header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut a_padded = vec![0u8; len];
    let mut b_padded = vec![0u8; len];
    a_padded[..a.len()].copy_from_slice(a);
    b_padded[..b.len()].copy_from_slice(b);

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.as_slice().ct_eq(b_padded.as_slice());
    (lengths_equal & contents_equal).into()
}

/// Axum middleware applying [`authorize`].
pub async fn security_middleware(
    State(policy): State<Arc<SecurityPolicy>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let decision = authorize(
        request.method(),
        request.uri().path(),
        request.headers(),
        &policy,
    );

    match decision {
        AuthDecision::Allow(principal) => {
            if let Some(principal) = principal {
                debug!(user = %principal.name, "Request authenticated");
                request.extensions_mut().insert(principal);
            }
            next.run(request).await
        }
        AuthDecision::Deny(failure) => {
            warn!(
                method = %request.method(),
                path = %request.uri().path(),
                reason = ?failure,
                "Request rejected by security gate"
            );
            IngressError::Unauthorized(failure).into_response()
        }
    }
}
