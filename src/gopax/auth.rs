//! Authentication utilities for the GOPAX API
//!
//! Implements HMAC-SHA512 request signing as per the official GOPAX API
//! documentation: the signing message is the concatenation of a literal
//! `t`, the millisecond timestamp, the uppercased method, the canonical
//! request path, the optional receive window and the optional JSON body.
//! The key is the base64-decoded API secret and the digest is emitted
//! base64-encoded.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use thiserror::Error;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

type HmacSha512 = Hmac<Sha512>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("API secret is not valid base64: {0}")]
    InvalidSecret(#[from] base64::DecodeError),
}

/// Canonical request path used in the signing message.
///
/// The query string participates in the signature only for `GET /orders?...`;
/// every other path is truncated at the first `?`.
pub fn canonical_path<'a>(method: &str, path: &'a str) -> &'a str {
    let include_querystring = method == "GET" && path.starts_with("/orders?");
    if include_querystring {
        path
    } else {
        path.split('?').next().unwrap_or(path)
    }
}

/// Build the message to be signed.
///
/// `method` must already be uppercased and `body_json` must be the exact
/// compact serialization that will be sent on the wire.
pub fn signing_message(
    timestamp_ms: i64,
    method: &str,
    path: &str,
    receive_window: Option<u32>,
    body_json: Option<&str>,
) -> String {
    let mut msg = format!("t{}{}{}", timestamp_ms, method, canonical_path(method, path));
    if let Some(window) = receive_window {
        msg.push_str(&window.to_string());
    }
    if let Some(body) = body_json {
        msg.push_str(body);
    }
    msg
}

/// Sign a message with a base64-encoded secret.
///
/// Pure function of its inputs; re-deriving the signature with the same
/// inputs always yields the same value.
pub fn sign(secret_b64: &str, message: &str) -> Result<String, AuthError> {
    let raw_secret = BASE64.decode(secret_b64)?;
    let mut mac =
        HmacSha512::new_from_slice(&raw_secret).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// API credentials container. Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Credentials {
    api_key: String,
    /// Base64-encoded shared secret
    secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Sign a prepared message
    pub fn sign(&self, message: &str) -> Result<String, AuthError> {
        sign(&self.secret, message)
    }
}
