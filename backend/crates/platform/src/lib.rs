//! Platform Crate - Technical Infrastructure
//!
//! Stateless building blocks shared by the backend:
//! - Password hashing (Argon2id, NIST SP 800-63B input policy)
//! - Signed, expiring tokens (HS256 JWT)
//! - Hashing / encoding helpers
//! - Cookie helpers

pub mod cookie;
pub mod crypto;
pub mod password;
pub mod token;
