//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin check, pre-flight answers)
//!     → auth.rs (basic auth, CSRF token check, exempt paths)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Modes are fixed at startup, never mutated at runtime
//! - Fail closed: reject on any security check failure
//! - Credentials and tokens compared in constant time

pub mod auth;
pub mod cors;
pub mod csrf;

pub use auth::{
    authorize, security_middleware, AuthDecision, AuthFailure, Principal, SecurityMode,
    SecurityPolicy,
};
pub use cors::{cors_middleware, CorsPolicy};
pub use csrf::{CsrfTokenResponse, CsrfTokens, CSRF_HEADER};
