//! Sign Out Use Case
//!
//! Ends the user's session by clearing the active refresh token.

use crate::application::session::SessionManager;
use crate::domain::entity::session::SessionState;
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<S>
where
    S: CredentialStore,
{
    sessions: SessionManager<S>,
}

impl<S> SignOutUseCase<S>
where
    S: CredentialStore,
{
    pub fn new(sessions: SessionManager<S>) -> Self {
        Self { sessions }
    }

    /// Idempotent; signing out twice is not an error
    pub async fn execute(&self, user_id: &UserId) -> AuthResult<()> {
        self.sessions.end_session(user_id).await?;

        tracing::info!(user_id = %user_id, state = %SessionState::LoggedOut, "User signed out");
        Ok(())
    }
}
