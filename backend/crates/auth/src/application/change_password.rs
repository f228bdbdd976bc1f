//! Change Password Use Case
//!
//! Replaces the password hash and revokes the active session in the same
//! store write, forcing a new login everywhere.

use std::sync::Arc;

use platform::password::{ClearTextPassword, PasswordHasher};

use crate::application::config::AuthConfig;
use crate::application::session::bounded;
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

pub struct ChangePasswordInput {
    pub user_id: UserId,
    pub old_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    hasher: Arc<PasswordHasher>,
    config: Arc<AuthConfig>,
}

impl<S> ChangePasswordUseCase<S>
where
    S: CredentialStore,
{
    pub fn new(store: Arc<S>, hasher: Arc<PasswordHasher>, config: Arc<AuthConfig>) -> Self {
        Self {
            store,
            hasher,
            config,
        }
    }

    pub async fn execute(&self, input: ChangePasswordInput) -> AuthResult<()> {
        if input.old_password.is_empty() || input.new_password.is_empty() {
            return Err(AuthError::Validation(
                "Old and new passwords are required".to_string(),
            ));
        }

        // Policy applies to the new password only
        let new_password = ClearTextPassword::new(input.new_password)?;
        let old_password = ClearTextPassword::for_verification(input.old_password)?;

        let user = bounded(
            self.config.store_timeout,
            self.store.find_by_id(&input.user_id),
        )
        .await?;

        let Some(user) = user else {
            self.hasher.burn(&old_password);
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .hasher
            .verify(&old_password, user.password_hash.as_phc_string())
        {
            tracing::warn!(user_id = %user.user_id, "Password change with wrong current password");
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = self.hasher.hash(&new_password)?;

        let updated = bounded(
            self.config.store_timeout,
            self.store
                .set_password_hash(&user.user_id, &user.password_hash, &new_hash),
        )
        .await?;

        if !updated {
            // Hash changed between our read and write
            tracing::warn!(user_id = %user.user_id, "Concurrent password change rejected");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.user_id, "Password changed, sessions revoked");
        Ok(())
    }
}
