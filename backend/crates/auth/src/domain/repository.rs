//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the
//! infrastructure layer.

use platform::password::HashedPassword;
use platform::token::RefreshTokenDigest;

use crate::domain::entity::user::UserRecord;
use crate::domain::value_object::{identifier::Identifier, user_id::UserId};
use crate::error::AuthResult;

/// Durable user records and the session field
///
/// Every write touching `refresh_token_digest` must be linearizable per
/// user. The conditional writes are single atomic operations, never a read
/// followed by a write.
#[trait_variant::make(CredentialStore: Send)]
pub trait LocalCredentialStore {
    /// Find a user whose username or email equals the identifier
    async fn find_by_identifier(&self, identifier: &Identifier) -> AuthResult<Option<UserRecord>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<UserRecord>>;

    /// Replace the refresh digest only if it currently equals `expected`
    ///
    /// Returns `false` when the stored digest differs (or is absent, or the
    /// user is gone).
    async fn cas_update_refresh_token(
        &self,
        user_id: &UserId,
        expected: &RefreshTokenDigest,
        new: &RefreshTokenDigest,
    ) -> AuthResult<bool>;

    /// Set the refresh digest only if the stored password hash still equals
    /// `expected`
    ///
    /// Binds a new session to the credentials it was verified against, so a
    /// login racing a password change cannot outlive the change.
    async fn set_refresh_token_if_hash(
        &self,
        user_id: &UserId,
        expected: &HashedPassword,
        digest: &RefreshTokenDigest,
    ) -> AuthResult<bool>;

    /// Unconditionally set or clear the refresh digest
    async fn set_refresh_token(
        &self,
        user_id: &UserId,
        digest: Option<&RefreshTokenDigest>,
    ) -> AuthResult<()>;

    /// Replace the password hash and clear the refresh digest in one write,
    /// only if the stored hash still equals `expected`
    async fn set_password_hash(
        &self,
        user_id: &UserId,
        expected: &HashedPassword,
        new: &HashedPassword,
    ) -> AuthResult<bool>;
}
