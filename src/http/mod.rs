//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request id, request span)
//!     → [cors + security gate] (crate::security)
//!     → server.rs ingress handler (route, decode, map headers, forward)
//!     → response.rs (202, or an IngressError rendered to a response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::IngressError;
pub use server::{AppState, HttpServer};
