//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → router.rs (resolve against the ingress route)
//!     → matcher.rs (Ant-style path pattern match)
//!     → Matched | MethodNotAllowed | NotFound
//! ```
//!
//! `matcher.rs` also provides the flat wildcard matcher used by header
//! mapping and CORS origin checks.

pub mod matcher;
pub mod router;

pub use matcher::{wildcard_match, wildcard_match_ignore_case, PathPattern, PatternError};
pub use router::{IngressRoute, RouteMatch};
