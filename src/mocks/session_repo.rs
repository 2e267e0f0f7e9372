//! Mock session repository for testing.

use crate::error::{AuthError, Result};
use crate::providers::SessionRepository;
use crate::state::{Session, SessionId, UserId};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Mock durable session repository.
///
/// In-memory, running on the application clock. The retention window of
/// the cleanup sweep is collapsed to zero so tests can observe deletion
/// without waiting.
#[derive(Debug, Clone, Default)]
pub struct MockSessionRepository {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl MockSessionRepository {
    /// Create a new mock repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, revoked ones included (for assertions).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn row_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Force a row's expiry into the past (for expiry tests).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn expire_now(&self, session_id: &SessionId) -> Result<()> {
        let mut sessions = self.lock()?;
        if let Some(session) = sessions.get_mut(session_id.as_str()) {
            session.expires_at = Utc::now() - Duration::seconds(1);
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))
    }
}

impl SessionRepository for MockSessionRepository {
    async fn insert(&self, session: &Session) -> Result<()> {
        let mut sessions = self.lock()?;

        if sessions.contains_key(session.session_id.as_str()) {
            return Err(AuthError::DatabaseError(
                "Session ID already exists".to_string(),
            ));
        }

        sessions.insert(session.session_id.0.clone(), session.clone());
        Ok(())
    }

    async fn fetch(&self, session_id: &SessionId) -> Result<Option<Session>> {
        Ok(self.lock()?.get(session_id.as_str()).cloned())
    }

    async fn fetch_active(&self, session_id: &SessionId) -> Result<Option<(Session, i64)>> {
        let now = Utc::now();
        Ok(self
            .lock()?
            .get(session_id.as_str())
            .filter(|s| s.is_active && s.expires_at > now)
            .map(|s| (s.clone(), (s.expires_at - now).num_seconds().max(0))))
    }

    async fn touch(&self, session_id: &SessionId) -> Result<()> {
        let mut sessions = self.lock()?;
        if let Some(session) = sessions.get_mut(session_id.as_str()) {
            session.last_activity = Utc::now();
        }
        Ok(())
    }

    async fn extend(&self, session_id: &SessionId, lifetime_secs: i64) -> Result<Option<Session>> {
        let now = Utc::now();
        let mut sessions = self.lock()?;

        Ok(sessions
            .get_mut(session_id.as_str())
            .filter(|s| s.is_active && s.expires_at > now)
            .map(|s| {
                s.expires_at = now + Duration::seconds(lifetime_secs);
                s.last_activity = now;
                s.clone()
            }))
    }

    async fn set_mfa_verified(&self, session_id: &SessionId) -> Result<Option<Session>> {
        let now = Utc::now();
        let mut sessions = self.lock()?;

        Ok(sessions
            .get_mut(session_id.as_str())
            .filter(|s| s.is_active && s.expires_at > now)
            .map(|s| {
                s.mfa_verified = true;
                s.last_activity = now;
                s.clone()
            }))
    }

    async fn rotate_tokens(
        &self,
        session_id: &SessionId,
        access_token: &str,
        refresh_token: &str,
        lifetime_secs: i64,
    ) -> Result<Option<Session>> {
        let now = Utc::now();
        let mut sessions = self.lock()?;

        Ok(sessions
            .get_mut(session_id.as_str())
            .filter(|s| s.is_active && s.expires_at > now)
            .map(|s| {
                s.access_token = access_token.to_string();
                s.refresh_token = refresh_token.to_string();
                s.expires_at = now + Duration::seconds(lifetime_secs);
                s.last_activity = now;
                s.clone()
            }))
    }

    async fn end(&self, session_id: &SessionId) -> Result<bool> {
        let mut sessions = self.lock()?;

        match sessions.get_mut(session_id.as_str()) {
            Some(session) if session.is_active => {
                session.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn end_all_for_user(
        &self,
        user_id: UserId,
        except: Option<&SessionId>,
    ) -> Result<Vec<SessionId>> {
        let mut sessions = self.lock()?;
        let mut ended = Vec::new();

        for session in sessions.values_mut() {
            if session.user_id == user_id
                && session.is_active
                && except != Some(&session.session_id)
            {
                session.is_active = false;
                ended.push(session.session_id.clone());
            }
        }

        Ok(ended)
    }

    async fn list_active(&self, user_id: UserId) -> Result<Vec<Session>> {
        let now = Utc::now();
        let mut active: Vec<Session> = self
            .lock()?
            .values()
            .filter(|s| s.user_id == user_id && s.is_active && s.expires_at > now)
            .cloned()
            .collect();

        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }

    async fn mark_suspicious(&self, session_id: &SessionId, reason: &str) -> Result<()> {
        let mut sessions = self.lock()?;
        if let Some(session) = sessions.get_mut(session_id.as_str()) {
            session.is_suspicious = true;
            session.suspicious_reason = Some(reason.to_string());
        }
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let mut sessions = self.lock()?;

        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);

        Ok((before - sessions.len()) as u64)
    }
}
