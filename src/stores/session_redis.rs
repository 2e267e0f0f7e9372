//! Redis-based session cache implementation.
//!
//! # Architecture
//!
//! Cached session views live under `session:{session_id}` as
//! bincode-serialized [`CachedSession`] values. The TTL is always the
//! durable store's remaining lifetime for the row, so a cache entry can
//! never outlive its session.
//!
//! # Example
//!
//! ```no_run
//! use bankauth::stores::RedisSessionCache;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = RedisSessionCache::new("redis://127.0.0.1:6379").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::providers::SessionCache;
use crate::state::{CachedSession, SessionId};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

/// Redis-based session cache with TTL in lock-step with the durable store.
///
/// Connection pooling via `ConnectionManager`; each call clones the
/// manager, which multiplexes over one reconnecting connection.
#[derive(Clone)]
pub struct RedisSessionCache {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisSessionCache {
    /// Create a new Redis session cache.
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

    /// Get the Redis key for a cached session.
    fn session_key(session_id: &SessionId) -> String {
        format!("session:{}", session_id.0)
    }
}

impl SessionCache for RedisSessionCache {
    async fn put(
        &self,
        session_id: &SessionId,
        cached: &CachedSession,
        ttl_secs: u64,
    ) -> Result<()> {
        // A zero TTL means the row already expired; there is nothing
        // worth caching.
        if ttl_secs == 0 {
            return Ok(());
        }

        let mut conn = self.conn_manager.clone();
        let session_key = Self::session_key(session_id);

        let bytes =
            bincode::serialize(cached).map_err(|e| AuthError::SerializationError(e.to_string()))?;

        let _: () = conn
            .set_ex(&session_key, bytes, ttl_secs)
            .await
            .map_err(|e| AuthError::CacheError(format!("Failed to cache session: {e}")))?;

        tracing::debug!(
            session_id = %session_id.0,
            ttl_seconds = ttl_secs,
            "Cached session view"
        );

        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<CachedSession>> {
        let mut conn = self.conn_manager.clone();
        let session_key = Self::session_key(session_id);

        let bytes: Option<Vec<u8>> = conn
            .get(&session_key)
            .await
            .map_err(|e| AuthError::CacheError(format!("Failed to get session from cache: {e}")))?;

        match bytes {
            Some(bytes) => {
                let cached: CachedSession = bincode::deserialize(&bytes)
                    .map_err(|e| AuthError::SerializationError(e.to_string()))?;
                Ok(Some(cached))
            }
            None => Ok(None),
        }
    }

    async fn evict(&self, session_id: &SessionId) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let session_key = Self::session_key(session_id);

        let _: () = conn
            .del(&session_key)
            .await
            .map_err(|e| AuthError::CacheError(format!("Failed to evict session: {e}")))?;

        tracing::debug!(session_id = %session_id.0, "Evicted cached session");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Session, SessionId, UserId};
    use crate::state::DeviceInfo;
    use chrono::{Duration, Utc};
    use std::net::{IpAddr, Ipv4Addr};

    // Note: These tests require a running Redis instance
    // Run with: docker run -d -p 6379:6379 redis:7-alpine

    fn cached_fixture() -> (SessionId, CachedSession) {
        let session = Session {
            session_id: SessionId::generate(),
            user_id: UserId::new(),
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            ip_address: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            user_agent: "Test".to_string(),
            device_info: DeviceInfo::default(),
            is_active: true,
            mfa_verified: true,
            is_suspicious: false,
            suspicious_reason: None,
            created_at: Utc::now(),
            last_activity: Utc::now(),
            expires_at: Utc::now() + Duration::hours(24),
        };
        (
            session.session_id.clone(),
            CachedSession::from_session(&session),
        )
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_cache_round_trip_and_evict() {
        let cache = RedisSessionCache::new("redis://127.0.0.1:6379")
            .await
            .unwrap();

        let (session_id, cached) = cached_fixture();

        cache.put(&session_id, &cached, 60).await.unwrap();

        let hit = cache.get(&session_id).await.unwrap();
        assert_eq!(hit, Some(cached));

        cache.evict(&session_id).await.unwrap();

        let miss = cache.get(&session_id).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_zero_ttl_is_not_cached() {
        let cache = RedisSessionCache::new("redis://127.0.0.1:6379")
            .await
            .unwrap();

        let (session_id, cached) = cached_fixture();

        cache.put(&session_id, &cached, 0).await.unwrap();

        let miss = cache.get(&session_id).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_entry_expires_with_ttl() {
        let cache = RedisSessionCache::new("redis://127.0.0.1:6379")
            .await
            .unwrap();

        let (session_id, cached) = cached_fixture();

        cache.put(&session_id, &cached, 1).await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

        let miss = cache.get(&session_id).await.unwrap();
        assert!(miss.is_none());
    }
}
