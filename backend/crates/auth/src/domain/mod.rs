//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    claims::{AccessClaims, RefreshClaims},
    session::{SessionState, TokenPair},
    user::{UserProfile, UserRecord},
};
pub use repository::CredentialStore;
