//! Error responses.
//!
//! # Responsibilities
//! - Map every rejection to its HTTP status
//! - Render JSON error bodies (`status`, `error`, `message`)
//! - Count rejections by reason
//!
//! # Design Decisions
//! - CORS rejections answer with a plain `Invalid CORS request` body
//! - Sink failures surface as 500 without internal details

use axum::{
    extract::rejection::BytesRejection,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::message::ContentTypeError;
use crate::observability::metrics;
use crate::security::AuthFailure;
use crate::sink::SinkError;

/// Body of CORS rejections.
pub const INVALID_CORS_REQUEST: &str = "Invalid CORS request";

/// Every way the source can refuse a request.
#[derive(Debug, Error)]
pub enum IngressError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{}", .0.message())]
    Unauthorized(AuthFailure),

    #[error("Invalid CORS request")]
    InvalidCors,

    #[error("No endpoint for {0}")]
    NotFound(String),

    #[error("Request method '{0}' not supported")]
    MethodNotAllowed(Method),

    #[error("{}", .0.body_text())]
    Body(#[from] BytesRejection),

    #[error("Failed to forward message: {0}")]
    Sink(#[from] SinkError),
}

impl From<ContentTypeError> for IngressError {
    fn from(err: ContentTypeError) -> Self {
        IngressError::BadRequest(err.to_string())
    }
}

impl IngressError {
    pub fn status(&self) -> StatusCode {
        match self {
            IngressError::BadRequest(_) => StatusCode::BAD_REQUEST,
            IngressError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            IngressError::InvalidCors => StatusCode::FORBIDDEN,
            IngressError::NotFound(_) => StatusCode::NOT_FOUND,
            IngressError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            IngressError::Body(rejection) => rejection.status(),
            IngressError::Sink(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            IngressError::BadRequest(_) => "bad_request",
            IngressError::Unauthorized(_) => "unauthorized",
            IngressError::InvalidCors => "cors",
            IngressError::NotFound(_) => "not_found",
            IngressError::MethodNotAllowed(_) => "method_not_allowed",
            IngressError::Body(_) => "body",
            IngressError::Sink(_) => "sink",
        }
    }

    fn client_message(&self) -> String {
        match self {
            IngressError::Sink(_) => "Failed to forward message".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        metrics::record_rejection(self.reason());
        let status = self.status();

        if let IngressError::InvalidCors = self {
            return (status, INVALID_CORS_REQUEST).into_response();
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "error": status.canonical_reason().unwrap_or_default(),
            "message": self.client_message(),
        }));
        let mut response = (status, body).into_response();

        match self {
            IngressError::Unauthorized(_) => {
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Basic realm=\"Realm\""),
                );
            }
            IngressError::MethodNotAllowed(_) => {
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static("POST"));
            }
            _ => {}
        }
        response
    }
}
