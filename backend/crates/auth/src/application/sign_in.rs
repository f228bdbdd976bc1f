//! Sign In Use Case
//!
//! Authenticates a user by username-or-email and password and starts a
//! session.

use std::sync::Arc;

use platform::password::{ClearTextPassword, PasswordHasher};

use crate::application::config::AuthConfig;
use crate::application::session::{SessionManager, bounded};
use crate::domain::entity::{
    session::{SessionState, TokenPair},
    user::UserProfile,
};
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::identifier::Identifier;
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    /// User name or email
    pub identifier: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub tokens: TokenPair,
    /// Sanitized record
    pub user: UserProfile,
}

/// Sign in use case
pub struct SignInUseCase<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    hasher: Arc<PasswordHasher>,
    sessions: SessionManager<S>,
    config: Arc<AuthConfig>,
}

impl<S> SignInUseCase<S>
where
    S: CredentialStore,
{
    pub fn new(
        store: Arc<S>,
        hasher: Arc<PasswordHasher>,
        sessions: SessionManager<S>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            store,
            hasher,
            sessions,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        if input.identifier.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation(
                "Username or email and password are required".to_string(),
            ));
        }

        let identifier = Identifier::parse(&input.identifier)?;
        let password = ClearTextPassword::for_verification(input.password)?;

        let user = bounded(
            self.config.store_timeout,
            self.store.find_by_identifier(&identifier),
        )
        .await?;

        let Some(user) = user else {
            // Same cost as a wrong password
            self.hasher.burn(&password);
            tracing::warn!("Login attempt for unknown identifier");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .hasher
            .verify(&password, user.password_hash.as_phc_string())
        {
            tracing::warn!(user_id = %user.user_id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.sessions.start_session(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            state = %SessionState::Authenticated,
            "User signed in"
        );

        Ok(SignInOutput {
            tokens,
            user: user.profile(),
        })
    }
}
