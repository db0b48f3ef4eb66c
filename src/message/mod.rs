//! Outbound message model.
//!
//! # Data Flow
//! ```text
//! request body + Content-Type
//!     → content_type.rs (classify text/binary, decode charset)
//!     → Payload + canonical content type
//! request headers
//!     → headers.rs (allow-list mapping)
//!     → message headers
//! → Message (immutable, handed to the sink)
//! ```

pub mod content_type;
pub mod headers;

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use uuid::Uuid;

pub use content_type::{Charset, ContentType, ContentTypeError};
pub use headers::HeaderMapper;

/// Message header holding the canonical content type.
pub const CONTENT_TYPE: &str = "content-type";
/// Message header holding the inbound HTTP method.
pub const REQUEST_METHOD: &str = "http_requestMethod";
/// Message header holding the inbound request URL.
pub const REQUEST_URL: &str = "http_requestUrl";
/// Message header holding the authenticated user, when there is one.
pub const USER_PRINCIPAL: &str = "http_userPrincipal";

/// Message body: decoded text or opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
}

impl Payload {
    /// Decode a request body according to its Content-Type header.
    ///
    /// Returns the payload and the canonical content type to attach to the
    /// message. A missing header is treated as `text/plain`.
    pub fn decode(
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<(Self, ContentType), ContentTypeError> {
        let content_type = match content_type {
            Some(raw) => ContentType::parse(raw)?,
            None => ContentType::text_plain(),
        };

        if !content_type.is_text() {
            return Ok((Payload::Binary(body), content_type));
        }

        let charset = match content_type.charset() {
            Some(name) => Charset::lookup(name)
                .ok_or_else(|| ContentTypeError::UnsupportedCharset(name.to_string()))?,
            None => Charset::utf8(),
        };
        let text = charset.decode(&body)?;

        Ok((Payload::Text(text), content_type.with_charset(charset)))
    }

    /// "text" or "binary", used as a log and metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text",
            Payload::Binary(_) => "binary",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A message emitted for one accepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: Uuid,
    timestamp: u64,
    payload: Payload,
    headers: BTreeMap<String, String>,
}

impl Message {
    /// Create a message with a fresh id and the current time.
    pub fn new(payload: Payload, headers: BTreeMap<String, String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            timestamp,
            payload,
            headers,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }
}
