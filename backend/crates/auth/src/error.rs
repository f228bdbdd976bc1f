//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::{PasswordHashError, PasswordPolicyError};
use platform::token::TokenError;
use thiserror::Error;

use crate::application::config::ConfigError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Message rendered for every unauthorized outcome
const UNAUTHORIZED_DETAIL: &str = "Invalid credentials";

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or malformed input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unknown identifier, wrong password, or a token for a user that no longer exists
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bad signature or structure
    #[error("Token is invalid")]
    TokenInvalid,

    #[error("Token has expired")]
    TokenExpired,

    /// Refresh token verified but is not the active one
    #[error("Refresh token has already been used")]
    TokenReused,

    /// Credential store did not answer in time
    #[error("Credential store timed out after {0:?}")]
    StoreTimeout(Duration),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Hashing or signing failure
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::TokenInvalid
            | AuthError::TokenExpired
            | AuthError::TokenReused => ErrorKind::Unauthorized,
            AuthError::StoreTimeout(_)
            | AuthError::Database(_)
            | AuthError::Crypto(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    /// Convert to AppError
    ///
    /// Unauthorized variants collapse to one message so callers cannot tell
    /// which check failed. Internal details never leave the process.
    pub fn to_app_error(&self) -> AppError {
        match self.kind() {
            ErrorKind::Unauthorized => AppError::unauthorized(UNAUTHORIZED_DETAIL),
            ErrorKind::BadRequest => AppError::bad_request(self.to_string()),
            kind => AppError::new(kind, "Internal server error"),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::StoreTimeout(limit) => {
                tracing::error!(timeout_ms = limit.as_millis() as u64, "Credential store timed out");
            }
            AuthError::Crypto(msg) => {
                tracing::error!(message = %msg, "Auth crypto error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::TokenReused => {
                tracing::warn!("Refresh token reuse rejected");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid credentials presented");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        match self {
            // Kernel mapping distinguishes pool exhaustion (503) from other faults
            AuthError::Database(e) => AppError::from(e).into_response(),
            other => other.to_app_error().into_response(),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid => AuthError::TokenInvalid,
            TokenError::Signing(msg) => AuthError::Crypto(msg),
        }
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        AuthError::Crypto(err.to_string())
    }
}

impl From<ConfigError> for AuthError {
    fn from(err: ConfigError) -> Self {
        AuthError::Internal(format!("invalid auth configuration: {err}"))
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::Validation(err.to_string())
    }
}
