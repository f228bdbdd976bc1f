//! In-Memory Credential Store
//!
//! `RwLock<HashMap>` backed store for tests and local development. Each
//! conditional write runs entirely under one write guard.

use std::collections::HashMap;

use chrono::Utc;
use platform::password::HashedPassword;
use platform::token::RefreshTokenDigest;
use tokio::sync::RwLock;

use crate::domain::entity::user::UserRecord;
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::{identifier::Identifier, user_id::UserId};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user. Username and email must be unused.
    pub async fn insert(&self, user: UserRecord) -> AuthResult<()> {
        let mut users = self.users.write().await;

        let taken = users
            .values()
            .any(|u| u.username == user.username || u.email == user.email);
        if taken {
            return Err(AuthError::Validation(
                "Username or email already exists".to_string(),
            ));
        }

        users.insert(user.user_id, user);
        Ok(())
    }

    pub async fn remove(&self, user_id: &UserId) -> Option<UserRecord> {
        self.users.write().await.remove(user_id)
    }

    pub async fn get(&self, user_id: &UserId) -> Option<UserRecord> {
        self.users.read().await.get(user_id).cloned()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_identifier(&self, identifier: &Identifier) -> AuthResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.username == identifier.as_str() || u.email == identifier.as_str())
            .cloned())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<UserRecord>> {
        Ok(self.get(user_id).await)
    }

    async fn cas_update_refresh_token(
        &self,
        user_id: &UserId,
        expected: &RefreshTokenDigest,
        new: &RefreshTokenDigest,
    ) -> AuthResult<bool> {
        let mut users = self.users.write().await;

        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };
        if user.refresh_token_digest.as_ref() != Some(expected) {
            return Ok(false);
        }

        user.refresh_token_digest = Some(new.clone());
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_refresh_token_if_hash(
        &self,
        user_id: &UserId,
        expected: &HashedPassword,
        digest: &RefreshTokenDigest,
    ) -> AuthResult<bool> {
        let mut users = self.users.write().await;

        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };
        if user.password_hash != *expected {
            return Ok(false);
        }

        user.refresh_token_digest = Some(digest.clone());
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_refresh_token(
        &self,
        user_id: &UserId,
        digest: Option<&RefreshTokenDigest>,
    ) -> AuthResult<()> {
        if let Some(user) = self.users.write().await.get_mut(user_id) {
            user.refresh_token_digest = digest.cloned();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_password_hash(
        &self,
        user_id: &UserId,
        expected: &HashedPassword,
        new: &HashedPassword,
    ) -> AuthResult<bool> {
        let mut users = self.users.write().await;

        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };
        if user.password_hash != *expected {
            return Ok(false);
        }

        user.password_hash = new.clone();
        user.refresh_token_digest = None;
        user.updated_at = Utc::now();
        Ok(true)
    }
}
