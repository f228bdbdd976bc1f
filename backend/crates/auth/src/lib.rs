//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, claims, value objects, credential store trait
//! - `application/` - Use cases, session manager, auth service
//! - `infra/` - PostgreSQL and in-memory credential stores
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Login with username or email + password
//! - Short-lived stateless access tokens
//! - Long-lived refresh tokens, rotated on every use
//! - Logout and password change revoke the active refresh token
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B input policy)
//! - Unknown users cost the same as wrong passwords
//! - Only a SHA-256 digest of the refresh token is stored
//! - Rotation is a compare-and-swap; replaying a superseded token fails
//! - Every store call is bounded by a timeout

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::{config::AuthConfig, service::AuthService};
pub use error::{AuthError, AuthResult};
pub use infra::{memory::InMemoryCredentialStore, postgres::PgCredentialStore};
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::{claims::*, session::*, user::*};
    pub use crate::domain::value_object::{identifier::Identifier, user_id::UserId};
    pub use crate::presentation::dto::*;
}
