//! Credential decoding. A credential is a three-segment JWT issued by the
//! identity provider; only the payload segment is read. Signatures are never
//! checked here, the remote API is the authority on authenticity.

use base64ct::{Base64UrlUnpadded, Encoding};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Claim holding the expiry instant in seconds since the Unix epoch.
pub const EXPIRY_CLAIM: &str = "exp";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json payload")]
    Json,
    #[error("payload is not a claim set")]
    NotAnObject,
}

/// Decoded key-value content carried inside a credential.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Expiry instant, accepting integer or fractional seconds.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        let value = self.0.get(EXPIRY_CLAIM)?;
        if let Some(secs) = value.as_i64() {
            return Some(secs);
        }
        // Rounded up, so `exp > now` on whole seconds matches the fractional instant.
        #[allow(clippy::cast_possible_truncation)]
        value
            .as_f64()
            .filter(|secs| secs.is_finite())
            .map(|secs| secs.ceil() as i64)
    }
}

/// A signed session token plus its decoded claim set.
#[derive(Clone)]
pub struct Credential {
    raw: SecretString,
    claims: Claims,
}

impl Credential {
    /// Decodes the payload segment of `raw`.
    ///
    /// # Errors
    /// Returns an error if the token does not have three segments, or the
    /// payload is not base64url-encoded JSON object.
    pub fn decode(raw: &str) -> Result<Self, CredentialError> {
        let raw = raw.trim();
        let mut segments = raw.split('.');
        let (Some(header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(CredentialError::TokenFormat);
        };

        if header.is_empty() || payload.is_empty() {
            return Err(CredentialError::TokenFormat);
        }

        let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('='))
            .map_err(|_| CredentialError::Base64)?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|_| CredentialError::Json)?;

        match value {
            Value::Object(map) => Ok(Self {
                raw: SecretString::from(raw.to_string()),
                claims: Claims(map),
            }),
            _ => Err(CredentialError::NotAnObject),
        }
    }

    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.claims.expires_at()
    }

    /// True only when an expiry claim exists and lies strictly after `now`.
    #[must_use]
    pub fn is_live_at(&self, now: i64) -> bool {
        self.expires_at().is_some_and(|exp| exp > now)
    }

    /// Encoded form, for the `Authorization` header and storage only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.raw.expose_secret()
    }

    #[must_use]
    pub fn raw(&self) -> &SecretString {
        &self.raw
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("raw", &"***")
            .field("exp", &self.expires_at())
            .field("sub", &self.claims.get_str("sub"))
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn encode_for_test(payload: &Value) -> String {
    let header = Base64UrlUnpadded::encode_string(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = Base64UrlUnpadded::encode_string(payload.to_string().as_bytes());
    format!("{header}.{body}.c2lnbmF0dXJl")
}
