//! PostgreSQL Credential Store
//!
//! Conditional writes are single `UPDATE ... WHERE <column> = $expected`
//! statements; success is read from `rows_affected`.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use platform::token::RefreshTokenDigest;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::user::UserRecord;
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::{identifier::Identifier, user_id::UserId};
use crate::error::AuthResult;

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_USER: &str = r#"
    SELECT
        user_id,
        username,
        email,
        full_name,
        password_hash,
        refresh_token_digest,
        created_at,
        updated_at
    FROM users
"#;

impl CredentialStore for PgCredentialStore {
    async fn find_by_identifier(&self, identifier: &Identifier) -> AuthResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} WHERE username = $1 OR email = $1 LIMIT 1"
        ))
        .bind(identifier.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_record))
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE user_id = $1"))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserRow::into_record))
    }

    async fn cas_update_refresh_token(
        &self,
        user_id: &UserId,
        expected: &RefreshTokenDigest,
        new: &RefreshTokenDigest,
    ) -> AuthResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                refresh_token_digest = $3,
                updated_at = NOW()
            WHERE user_id = $1
              AND refresh_token_digest = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(expected.as_str())
        .bind(new.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn set_refresh_token_if_hash(
        &self,
        user_id: &UserId,
        expected: &HashedPassword,
        digest: &RefreshTokenDigest,
    ) -> AuthResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                refresh_token_digest = $3,
                updated_at = NOW()
            WHERE user_id = $1
              AND password_hash = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(expected.as_phc_string())
        .bind(digest.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn set_refresh_token(
        &self,
        user_id: &UserId,
        digest: Option<&RefreshTokenDigest>,
    ) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                refresh_token_digest = $2,
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(digest.map(RefreshTokenDigest::as_str))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_password_hash(
        &self,
        user_id: &UserId,
        expected: &HashedPassword,
        new: &HashedPassword,
    ) -> AuthResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                password_hash = $3,
                refresh_token_digest = NULL,
                updated_at = NOW()
            WHERE user_id = $1
              AND password_hash = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(expected.as_phc_string())
        .bind(new.as_phc_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    username: String,
    email: String,
    full_name: String,
    password_hash: String,
    refresh_token_digest: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self) -> UserRecord {
        UserRecord {
            user_id: UserId::from_uuid(self.user_id),
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            password_hash: HashedPassword::from_stored(self.password_hash),
            refresh_token_digest: self.refresh_token_digest.map(RefreshTokenDigest::from_stored),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
