//! Session State

use std::fmt;

use derive_more::Display;

use crate::domain::entity::user::UserRecord;

/// Server-side session state of one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    /// No session has been started
    #[display("anonymous")]
    Anonymous,
    /// A refresh token is outstanding
    #[display("authenticated")]
    Authenticated,
    /// The session was ended explicitly; equivalent to `Anonymous`
    #[display("logged_out")]
    LoggedOut,
}

impl SessionState {
    /// State as observed from a stored record
    ///
    /// The store does not remember how a session ended, so a record without
    /// a refresh digest reads as `Anonymous`.
    pub fn of(user: &UserRecord) -> Self {
        if user.refresh_token_digest.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn is_authenticated(self) -> bool {
        self == SessionState::Authenticated
    }
}

/// Freshly issued access/refresh tokens
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}
