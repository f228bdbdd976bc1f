//! Auth Service
//!
//! Entry point for the login / refresh / logout / change-password state
//! machine. Each operation delegates to its use case; this type owns the
//! shared collaborators.

use std::sync::Arc;

use platform::password::PasswordHasher;
use platform::token::TokenCodec;

use crate::application::change_password::{ChangePasswordInput, ChangePasswordUseCase};
use crate::application::config::AuthConfig;
use crate::application::refresh::RefreshUseCase;
use crate::application::session::{SessionManager, bounded};
use crate::application::sign_in::{SignInInput, SignInOutput, SignInUseCase};
use crate::application::sign_out::SignOutUseCase;
use crate::domain::entity::{
    claims::AccessClaims,
    session::{SessionState, TokenPair},
};
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

pub struct AuthService<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    hasher: Arc<PasswordHasher>,
    sessions: SessionManager<S>,
    config: Arc<AuthConfig>,
}

impl<S> Clone for AuthService<S>
where
    S: CredentialStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hasher: Arc::clone(&self.hasher),
            sessions: self.sessions.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> AuthService<S>
where
    S: CredentialStore,
{
    /// Validates the configuration and builds the password hasher
    pub fn new(store: Arc<S>, config: AuthConfig) -> AuthResult<Self> {
        config.validate()?;

        let hasher = PasswordHasher::new(config.hashing, config.password_pepper.clone())?;
        let config = Arc::new(config);

        Ok(Self {
            sessions: SessionManager::new(Arc::clone(&store), Arc::clone(&config)),
            store,
            hasher: Arc::new(hasher),
            config,
        })
    }

    /// Anonymous → Authenticated
    pub async fn login(&self, identifier: String, password: String) -> AuthResult<SignInOutput> {
        SignInUseCase::new(
            Arc::clone(&self.store),
            Arc::clone(&self.hasher),
            self.sessions.clone(),
            Arc::clone(&self.config),
        )
        .execute(SignInInput {
            identifier,
            password,
        })
        .await
    }

    /// Authenticated → Authenticated (rotated)
    pub async fn refresh(&self, presented: &str) -> AuthResult<TokenPair> {
        RefreshUseCase::new(
            Arc::clone(&self.store),
            self.sessions.clone(),
            Arc::clone(&self.config),
        )
        .execute(presented)
        .await
    }

    /// Authenticated → LoggedOut
    pub async fn logout(&self, user_id: &UserId) -> AuthResult<()> {
        SignOutUseCase::new(self.sessions.clone())
            .execute(user_id)
            .await
    }

    pub async fn change_password(
        &self,
        user_id: UserId,
        old_password: String,
        new_password: String,
    ) -> AuthResult<()> {
        ChangePasswordUseCase::new(
            Arc::clone(&self.store),
            Arc::clone(&self.hasher),
            Arc::clone(&self.config),
        )
        .execute(ChangePasswordInput {
            user_id,
            old_password,
            new_password,
        })
        .await
    }

    /// Verify an access token (signature and expiry only, no store access)
    pub fn authenticate(&self, access_token: &str) -> AuthResult<AccessClaims> {
        if access_token.is_empty() {
            return Err(AuthError::TokenInvalid);
        }
        Ok(TokenCodec::verify(
            access_token,
            &self.config.access_token_secret,
        )?)
    }

    /// Current server-side state for a user
    pub async fn session_state(&self, user_id: &UserId) -> AuthResult<SessionState> {
        let user = bounded(self.config.store_timeout, self.store.find_by_id(user_id))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(SessionState::of(&user))
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Hasher configured for this service (cost and pepper)
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }
}
