//! Signed Expiring Tokens
//!
//! HS256 JWTs carrying an arbitrary claim set plus an envelope:
//! - `iat` / `exp`: issue and expiry time (seconds since epoch)
//! - `jti`: random UUID, so two tokens for the same claims never collide
//!
//! Verification uses zero leeway: a token is expired as soon as `exp` passes.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::crypto::{constant_time_eq, random_bytes, sha256, to_base64url};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is invalid")]
    Invalid,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

// ============================================================================
// Secret
// ============================================================================

/// HMAC signing key, zeroized on drop
#[derive(Clone)]
pub struct TokenSecret(Zeroizing<Vec<u8>>);

impl TokenSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Random 64-byte secret
    pub fn generate() -> Self {
        Self::new(random_bytes(64))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for TokenSecret {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(self.as_bytes(), other.as_bytes())
    }
}

impl Eq for TokenSecret {}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TokenSecret").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// Codec
// ============================================================================

#[derive(Serialize, Deserialize)]
struct Envelope<C> {
    #[serde(flatten)]
    claims: C,
    iat: i64,
    exp: i64,
    jti: Uuid,
}

/// Stateless token issuing and verification
pub struct TokenCodec;

impl TokenCodec {
    /// Issue a token valid for `ttl` from now
    pub fn issue<C: Serialize>(
        claims: &C,
        secret: &TokenSecret,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        Self::issue_at(claims, secret, ttl, Utc::now())
    }

    /// Issue a token as if at `issued_at`
    pub fn issue_at<C: Serialize>(
        claims: &C,
        secret: &TokenSecret,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = i64::try_from(ttl.as_secs())
            .map_err(|_| TokenError::Signing("ttl out of range".to_string()))?;
        let iat = issued_at.timestamp();
        let exp = iat
            .checked_add(ttl)
            .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;

        let envelope = Envelope {
            claims,
            iat,
            exp,
            jti: Uuid::new_v4(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &envelope,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Check signature and expiry, then return the claim set
    pub fn verify<C: DeserializeOwned>(token: &str, secret: &TokenSecret) -> Result<C, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        decode::<Envelope<C>>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims.claims)
        .map_err(|e| match e.kind() {
            JwtErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
    }
}

// ============================================================================
// Refresh token digest
// ============================================================================

/// SHA-256 of a refresh token (base64url), the form persisted by the store
#[derive(Clone, Debug)]
pub struct RefreshTokenDigest(String);

impl RefreshTokenDigest {
    pub fn of(token: &str) -> Self {
        Self(to_base64url(&sha256(token.as_bytes())))
    }

    /// Wrap a digest read back from storage
    pub fn from_stored(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl PartialEq for RefreshTokenDigest {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Eq for RefreshTokenDigest {}
