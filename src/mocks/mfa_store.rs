//! Mock MFA store for testing.

use crate::error::{AuthError, Result};
use crate::providers::MfaStore;
use crate::state::UserId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Windowed counter entry.
#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u32,
    window_end: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    codes: HashMap<UserId, (String, DateTime<Utc>)>,
    failures: HashMap<UserId, Counter>,
    resends: HashMap<UserId, Counter>,
}

/// Mock MFA store.
///
/// In-memory with real TTL semantics on both the code and the counter
/// windows.
#[derive(Debug, Clone, Default)]
pub struct MockMfaStore {
    inner: Arc<Mutex<Inner>>,
}

impl MockMfaStore {
    /// Create a new mock MFA store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))
    }

    fn window_end(window: Duration) -> Result<DateTime<Utc>> {
        let window = chrono::Duration::from_std(window)
            .map_err(|e| AuthError::InternalError(format!("Window out of range: {e}")))?;
        Ok(Utc::now() + window)
    }

    fn incr(counters: &mut HashMap<UserId, Counter>, user_id: UserId, window_end: DateTime<Utc>) -> u32 {
        let now = Utc::now();
        let counter = counters.entry(user_id).or_insert(Counter {
            count: 0,
            window_end,
        });

        if counter.window_end <= now {
            // The previous window lapsed; this increment starts a new one.
            counter.count = 0;
            counter.window_end = window_end;
        }

        counter.count += 1;
        counter.count
    }
}

impl MfaStore for MockMfaStore {
    async fn put_code(&self, user_id: UserId, code: &str, ttl: Duration) -> Result<()> {
        let deadline = Self::window_end(ttl)?;
        self.lock()?
            .codes
            .insert(user_id, (code.to_string(), deadline));
        Ok(())
    }

    async fn get_code(&self, user_id: UserId) -> Result<Option<String>> {
        let inner = self.lock()?;
        Ok(inner
            .codes
            .get(&user_id)
            .filter(|(_, deadline)| *deadline > Utc::now())
            .map(|(code, _)| code.clone()))
    }

    async fn delete_code(&self, user_id: UserId) -> Result<()> {
        self.lock()?.codes.remove(&user_id);
        Ok(())
    }

    async fn incr_failures(&self, user_id: UserId, window: Duration) -> Result<u32> {
        let window_end = Self::window_end(window)?;
        let mut inner = self.lock()?;
        Ok(Self::incr(&mut inner.failures, user_id, window_end))
    }

    async fn failure_count(&self, user_id: UserId) -> Result<u32> {
        let inner = self.lock()?;
        Ok(inner
            .failures
            .get(&user_id)
            .filter(|c| c.window_end > Utc::now())
            .map_or(0, |c| c.count))
    }

    async fn clear_failures(&self, user_id: UserId) -> Result<()> {
        self.lock()?.failures.remove(&user_id);
        Ok(())
    }

    async fn incr_resends(&self, user_id: UserId, window: Duration) -> Result<u32> {
        let window_end = Self::window_end(window)?;
        let mut inner = self.lock()?;
        Ok(Self::incr(&mut inner.resends, user_id, window_end))
    }
}
