//! Stateless CSRF tokens.
//!
//! A token is `base64url(nonce ‖ HMAC-SHA256(key, principal ‖ nonce))`.
//! Tokens are bound to the user they were issued to and can be verified
//! without keeping server-side state.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::Serialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Request header carrying the CSRF token.
pub const CSRF_HEADER: &str = "x-csrf-token";

const NONCE_LEN: usize = 16;
const TAG_LEN: usize = 32;

/// Body of the CSRF token endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CsrfTokenResponse {
    pub header_name: &'static str,
    pub token: String,
}

impl CsrfTokenResponse {
    pub fn new(token: String) -> Self {
        Self {
            header_name: "X-CSRF-TOKEN",
            token,
        }
    }
}

/// Issues and verifies CSRF tokens.
#[derive(Clone)]
pub struct CsrfTokens {
    key: Vec<u8>,
}

impl fmt::Debug for CsrfTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfTokens").field("key", &"<redacted>").finish()
    }
}

impl CsrfTokens {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Tokens signed with a key that lives only as long as the process.
    pub fn random() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(key.to_vec())
    }

    /// Use the configured secret, or a random key when it is empty.
    pub fn from_secret(secret: &str) -> Self {
        if secret.is_empty() {
            Self::random()
        } else {
            Self::new(secret.as_bytes())
        }
    }

    fn mac(&self, principal: &str, nonce: &[u8]) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(principal.as_bytes());
        mac.update(nonce);
        mac
    }

    /// Issue a fresh token for `principal`.
    pub fn issue(&self, principal: &str) -> String {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let tag = self.mac(principal, &nonce).finalize().into_bytes();
        let mut raw = Vec::with_capacity(NONCE_LEN + TAG_LEN);
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&tag);
        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Check a token presented by `principal`. Comparison is constant time.
    pub fn verify(&self, principal: &str, token: &str) -> bool {
        let Ok(raw) = URL_SAFE_NO_PAD.decode(token.trim()) else {
            return false;
        };
        if raw.len() != NONCE_LEN + TAG_LEN {
            return false;
        }
        let (nonce, tag) = raw.split_at(NONCE_LEN);
        self.mac(principal, nonce).verify_slice(tag).is_ok()
    }
}
