//! Signed identity token (HS256).
//!
//! The token carries the identity fields of the last successful login plus
//! `iat`/`exp`. Signing and verification use the configured secret only.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use super::principal::{Identity, Principal};

/// Seconds since the Unix epoch.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityToken {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: u64,
    pub exp: u64,
}

impl IdentityToken {
    /// Build a fresh token for a principal; every identity field is replaced.
    #[must_use]
    pub fn issue(principal: &Principal, now: u64, max_age_seconds: u64) -> Self {
        let Identity {
            id,
            name,
            email,
            role,
        } = principal.identity();
        Self {
            id,
            name,
            email,
            role,
            iat: now,
            exp: now.saturating_add(max_age_seconds),
        }
    }

    /// Same identity, new lifetime.
    #[must_use]
    pub fn renewed(&self, now: u64, max_age_seconds: u64) -> Self {
        Self {
            iat: now,
            exp: now.saturating_add(max_age_seconds),
            ..self.clone()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("signing secret must not be empty")]
    MissingSecret,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    /// # Errors
    /// Returns [`TokenError::MissingSecret`] for an empty secret.
    pub fn new(secret: &SecretString) -> Result<Self, TokenError> {
        let secret = secret.expose_secret().as_bytes();
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// # Errors
    /// Returns [`TokenError::Signing`] if the claims cannot be encoded.
    pub fn sign(&self, token: &IdentityToken) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), token, &self.encoding)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }

    /// # Errors
    /// Returns an error for bad signatures, expired tokens or malformed input.
    pub fn verify(&self, raw: &str) -> Result<IdentityToken, TokenError> {
        decode::<IdentityToken>(raw, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
