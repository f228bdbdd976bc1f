//! Token Claims
//!
//! Claim sets carried inside access and refresh tokens. The codec adds
//! `iat`, `exp` and `jti` around them.

use serde::{Deserialize, Serialize};

use crate::domain::entity::user::UserRecord;
use crate::domain::value_object::user_id::UserId;

/// Access token claims (stateless: signature and expiry only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub fullname: String,
}

/// Refresh token claims (stateful: also checked against the stored digest)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub id: UserId,
}

impl From<&UserRecord> for AccessClaims {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.user_id,
            email: user.email.clone(),
            username: user.username.clone(),
            fullname: user.full_name.clone(),
        }
    }
}

impl From<&UserRecord> for RefreshClaims {
    fn from(user: &UserRecord) -> Self {
        Self { id: user.user_id }
    }
}
