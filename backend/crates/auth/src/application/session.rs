//! Session Manager
//!
//! Owns the "one active refresh token per user" rule. Tokens are always
//! issued before the single store write that commits them, so a failed
//! write leaves the previous session untouched.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use platform::token::{RefreshTokenDigest, TokenCodec};

use crate::application::config::AuthConfig;
use crate::domain::entity::{
    claims::{AccessClaims, RefreshClaims},
    session::TokenPair,
    user::UserRecord,
};
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Run a store call under the configured timeout
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> AuthResult<T>
where
    F: Future<Output = AuthResult<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| AuthError::StoreTimeout(limit))?
}

pub struct SessionManager<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> Clone for SessionManager<S>
where
    S: CredentialStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> SessionManager<S>
where
    S: CredentialStore,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Issue a new pair and make its refresh token the active one
    ///
    /// A fresh login supersedes any previous session. The write only lands
    /// while `user.password_hash` is still the stored hash; if the password
    /// changed after it was verified, fails with `InvalidCredentials`.
    pub async fn start_session(&self, user: &UserRecord) -> AuthResult<TokenPair> {
        let tokens = self.issue_pair(user)?;
        let digest = RefreshTokenDigest::of(&tokens.refresh_token);

        let stored = bounded(
            self.config.store_timeout,
            self.store
                .set_refresh_token_if_hash(&user.user_id, &user.password_hash, &digest),
        )
        .await?;

        if !stored {
            tracing::warn!(user_id = %user.user_id, "Credentials changed during sign in");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(tokens)
    }

    /// Swap `presented` for a newly issued refresh token
    ///
    /// The comparison and the write are one conditional store operation.
    /// If the stored digest no longer matches, fails with `TokenReused`.
    pub async fn rotate_session(&self, user: &UserRecord, presented: &str) -> AuthResult<TokenPair> {
        let tokens = self.issue_pair(user)?;
        let expected = RefreshTokenDigest::of(presented);
        let replacement = RefreshTokenDigest::of(&tokens.refresh_token);

        let swapped = bounded(
            self.config.store_timeout,
            self.store
                .cas_update_refresh_token(&user.user_id, &expected, &replacement),
        )
        .await?;

        if !swapped {
            tracing::warn!(user_id = %user.user_id, "Refresh token lost rotation race or was replayed");
            return Err(AuthError::TokenReused);
        }

        Ok(tokens)
    }

    /// Clear the active refresh token. Idempotent.
    pub async fn end_session(&self, user_id: &UserId) -> AuthResult<()> {
        bounded(
            self.config.store_timeout,
            self.store.set_refresh_token(user_id, None),
        )
        .await
    }

    fn issue_pair(&self, user: &UserRecord) -> AuthResult<TokenPair> {
        let access_token = TokenCodec::issue(
            &AccessClaims::from(user),
            &self.config.access_token_secret,
            self.config.access_token_ttl,
        )?;
        let refresh_token = TokenCodec::issue(
            &RefreshClaims::from(user),
            &self.config.refresh_token_secret,
            self.config.refresh_token_ttl,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
