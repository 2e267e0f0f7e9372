//! Mock session cache for testing.

use crate::error::{AuthError, Result};
use crate::providers::SessionCache;
use crate::state::{CachedSession, SessionId};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Mock session cache.
///
/// In-memory with real TTL semantics (entries past their deadline read
/// as misses). Can be switched into a failing mode to exercise the
/// fail-open read path.
#[derive(Debug, Clone, Default)]
pub struct MockSessionCache {
    entries: Arc<Mutex<HashMap<String, (CachedSession, DateTime<Utc>)>>>,
    failing: Arc<AtomicBool>,
    hits: Arc<AtomicU64>,
}

impl MockSessionCache {
    /// Create a new mock cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch cache failures on or off.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of cache hits served so far.
    #[must_use]
    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }

    /// Whether an entry (expired or not) exists for this id.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn contains(&self, session_id: &SessionId) -> Result<bool> {
        Ok(self.lock()?.contains_key(session_id.as_str()))
    }

    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<String, (CachedSession, DateTime<Utc>)>>> {
        self.entries
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::CacheError("Cache unavailable".to_string()));
        }
        Ok(())
    }
}

impl SessionCache for MockSessionCache {
    async fn put(
        &self,
        session_id: &SessionId,
        cached: &CachedSession,
        ttl_secs: u64,
    ) -> Result<()> {
        self.check_failing()?;

        if ttl_secs == 0 {
            return Ok(());
        }

        #[allow(clippy::cast_possible_wrap)]
        let deadline = Utc::now() + Duration::seconds(ttl_secs as i64);
        self.lock()?
            .insert(session_id.0.clone(), (cached.clone(), deadline));
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<CachedSession>> {
        self.check_failing()?;

        let entries = self.lock()?;
        match entries.get(session_id.as_str()) {
            Some((cached, deadline)) if *deadline > Utc::now() => {
                self.hits.fetch_add(1, Ordering::SeqCst);
                Ok(Some(cached.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn evict(&self, session_id: &SessionId) -> Result<()> {
        self.check_failing()?;

        self.lock()?.remove(session_id.as_str());
        Ok(())
    }
}
