//! Refresh Use Case
//!
//! Exchanges the active refresh token for a new pair (rotation).

use std::sync::Arc;

use platform::token::{RefreshTokenDigest, TokenCodec};

use crate::application::config::AuthConfig;
use crate::application::session::{SessionManager, bounded};
use crate::domain::entity::{claims::RefreshClaims, session::TokenPair};
use crate::domain::repository::CredentialStore;
use crate::error::{AuthError, AuthResult};

pub struct RefreshUseCase<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    sessions: SessionManager<S>,
    config: Arc<AuthConfig>,
}

impl<S> RefreshUseCase<S>
where
    S: CredentialStore,
{
    pub fn new(store: Arc<S>, sessions: SessionManager<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            store,
            sessions,
            config,
        }
    }

    pub async fn execute(&self, presented: &str) -> AuthResult<TokenPair> {
        if presented.is_empty() {
            return Err(AuthError::Validation(
                "Refresh token is required".to_string(),
            ));
        }

        let claims: RefreshClaims =
            TokenCodec::verify(presented, &self.config.refresh_token_secret)?;

        let user = bounded(self.config.store_timeout, self.store.find_by_id(&claims.id))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // Early out for tokens that are plainly stale; the CAS below is authoritative
        if user.refresh_token_digest.as_ref() != Some(&RefreshTokenDigest::of(presented)) {
            tracing::warn!(user_id = %user.user_id, "Superseded refresh token presented");
            return Err(AuthError::TokenReused);
        }

        let tokens = self.sessions.rotate_session(&user, presented).await?;

        tracing::info!(user_id = %user.user_id, "Session refreshed");

        Ok(tokens)
    }
}
