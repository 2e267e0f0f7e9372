//! Redis-based MFA code and counter store.
//!
//! # Keys
//!
//! - `mfa_code:{user_id}` → the live six-digit code (TTL = code lifetime)
//! - `mfa_fail:{user_id}` → failed-verification counter (TTL = failure window)
//! - `mfa_resend:{user_id}` → issue/resend counter (TTL = resend window)
//!
//! A `SET` with TTL on the code key gives the single-flight guarantee
//! for free: issuing a new code replaces the old one in the same write.
//! Counters use `INCR` + `EXPIRE NX` semantics so the window starts at
//! the first increment and is not pushed out by later ones.

use crate::error::{AuthError, Result};
use crate::providers::MfaStore;
use crate::state::UserId;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

/// Redis-based ephemeral store for MFA challenges and abuse counters.
#[derive(Clone)]
pub struct RedisMfaStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisMfaStore {
    /// Create a new Redis MFA store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    ///
    /// # Errors
    ///
    /// Returns error if connection to Redis fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| AuthError::CacheError(format!("Failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            AuthError::CacheError(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self { conn_manager })
    }

    /// Get the Redis key for a user's live code.
    fn code_key(user_id: UserId) -> String {
        format!("mfa_code:{}", user_id.0)
    }

    /// Get the Redis key for a user's failed-verification counter.
    fn fail_key(user_id: UserId) -> String {
        format!("mfa_fail:{}", user_id.0)
    }

    /// Get the Redis key for a user's issue/resend counter.
    fn resend_key(user_id: UserId) -> String {
        format!("mfa_resend:{}", user_id.0)
    }

    /// Atomically increment a windowed counter and return the new count.
    ///
    /// `EXPIRE NX` only sets the TTL when the key has none, so the
    /// window is anchored at the first increment.
    async fn incr_windowed(&self, key: &str, window: Duration) -> Result<u32> {
        let mut conn = self.conn_manager.clone();

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let window_secs = window.as_secs() as i64;

        let (count,): (u32,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .cmd("EXPIRE")
            .arg(key)
            .arg(window_secs)
            .arg("NX")
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthError::CacheError(format!("Failed to increment counter: {e}")))?;

        Ok(count)
    }
}

impl MfaStore for RedisMfaStore {
    async fn put_code(&self, user_id: UserId, code: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let code_key = Self::code_key(user_id);

        let _: () = conn
            .set_ex(&code_key, code, ttl.as_secs())
            .await
            .map_err(|e| AuthError::CacheError(format!("Failed to store MFA code: {e}")))?;

        tracing::debug!(
            user_id = %user_id.0,
            ttl_seconds = ttl.as_secs(),
            "Stored MFA code"
        );

        Ok(())
    }

    async fn get_code(&self, user_id: UserId) -> Result<Option<String>> {
        let mut conn = self.conn_manager.clone();
        let code_key = Self::code_key(user_id);

        let code: Option<String> = conn
            .get(&code_key)
            .await
            .map_err(|e| AuthError::CacheError(format!("Failed to get MFA code: {e}")))?;

        Ok(code)
    }

    async fn delete_code(&self, user_id: UserId) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let code_key = Self::code_key(user_id);

        let _: () = conn
            .del(&code_key)
            .await
            .map_err(|e| AuthError::CacheError(format!("Failed to delete MFA code: {e}")))?;

        Ok(())
    }

    async fn incr_failures(&self, user_id: UserId, window: Duration) -> Result<u32> {
        self.incr_windowed(&Self::fail_key(user_id), window).await
    }

    async fn failure_count(&self, user_id: UserId) -> Result<u32> {
        let mut conn = self.conn_manager.clone();
        let fail_key = Self::fail_key(user_id);

        let count: Option<u32> = conn
            .get(&fail_key)
            .await
            .map_err(|e| AuthError::CacheError(format!("Failed to get failure count: {e}")))?;

        Ok(count.unwrap_or(0))
    }

    async fn clear_failures(&self, user_id: UserId) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let fail_key = Self::fail_key(user_id);

        let _: () = conn
            .del(&fail_key)
            .await
            .map_err(|e| AuthError::CacheError(format!("Failed to clear failure count: {e}")))?;

        Ok(())
    }

    async fn incr_resends(&self, user_id: UserId, window: Duration) -> Result<u32> {
        self.incr_windowed(&Self::resend_key(user_id), window).await
    }
}
