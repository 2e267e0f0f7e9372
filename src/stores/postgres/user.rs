//! PostgreSQL user directory implementation.
//!
//! Reads the user profile table owned by the profile service and writes
//! back only the fields the authentication flows own: the MFA flag, the
//! last-login timestamp and the password hash.

use crate::error::{AuthError, Result};
use crate::providers::UserDirectory;
use crate::state::{AccountStatus, UserId, UserRecord};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed user directory.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

/// Raw row shape of the `users` table.
#[derive(Debug, FromRow)]
struct UserRow {
    user_id: uuid::Uuid,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    mfa_enabled: bool,
    status: String,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self> {
        let status = AccountStatus::from_str(&row.status).map_err(AuthError::DatabaseError)?;

        Ok(Self {
            user_id: UserId(row.user_id),
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            mfa_enabled: row.mfa_enabled,
            status,
            last_login: row.last_login,
        })
    }
}

const USER_COLUMNS: &str =
    "user_id, email, first_name, last_name, password_hash, mfa_enabled, status, last_login";

impl PostgresUserDirectory {
    /// Create a new PostgreSQL user directory.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn db_err(context: &str, e: sqlx::Error) -> AuthError {
        AuthError::DatabaseError(format!("{context}: {e}"))
    }
}

impl UserDirectory for PostgresUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| Self::db_err("Failed to look up user by email", e))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"))
                .bind(user_id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| Self::db_err("Failed to look up user by id", e))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn set_mfa_enabled(&self, user_id: UserId, enabled: bool) -> Result<()> {
        sqlx::query("UPDATE users SET mfa_enabled = $2 WHERE user_id = $1")
            .bind(user_id.0)
            .bind(enabled)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::db_err("Failed to update MFA flag", e))?;

        Ok(())
    }

    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE user_id = $1")
            .bind(user_id.0)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::db_err("Failed to record login", e))?;

        Ok(())
    }

    async fn set_password_hash(&self, user_id: UserId, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE user_id = $1")
            .bind(user_id.0)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::db_err("Failed to update password hash", e))?;

        Ok(())
    }
}
