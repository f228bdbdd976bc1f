//! User Entity
//!
//! Credential-bearing user record and its sanitized projection.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use platform::token::RefreshTokenDigest;
use serde::Serialize;

use crate::domain::value_object::{identifier::canonicalize, user_id::UserId};

/// Stored user record
///
/// `refresh_token_digest` is the single source of truth for session
/// validity: at most one refresh token is outstanding per user.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    /// Unique, canonical (trimmed, lowercase)
    pub username: String,
    /// Unique, canonical (trimmed, lowercase)
    pub email: String,
    pub full_name: String,
    /// Argon2id PHC string
    pub password_hash: HashedPassword,
    /// SHA-256 of the active refresh token, `None` when logged out
    pub refresh_token_digest: Option<RefreshTokenDigest>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Build a fresh record with no active session
    pub fn new(
        username: &str,
        email: &str,
        full_name: impl Into<String>,
        password_hash: HashedPassword,
    ) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            username: canonicalize(username),
            email: canonicalize(email),
            full_name: full_name.into().trim().to_string(),
            password_hash,
            refresh_token_digest: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sanitized view (no password hash, no refresh digest)
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.user_id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
