//! Mock user directory for testing.

use crate::error::{AuthError, Result};
use crate::providers::UserDirectory;
use crate::state::{UserId, UserRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock user directory.
///
/// Uses in-memory storage for testing.
#[derive(Debug, Clone, Default)]
pub struct MockUserDirectory {
    users: Arc<Mutex<HashMap<UserId, UserRecord>>>,
}

impl MockUserDirectory {
    /// Create an empty mock directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user record.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn insert_user(&self, user: UserRecord) -> Result<()> {
        self.lock()?.insert(user.user_id, user);
        Ok(())
    }

    /// Read back a stored record (for assertions).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn user(&self, user_id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.lock()?.get(&user_id).cloned())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<UserId, UserRecord>>> {
        self.users
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))
    }
}

impl UserDirectory for MockUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.lock()?.values().find(|u| u.email == email).cloned())
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.lock()?.get(&user_id).cloned())
    }

    async fn set_mfa_enabled(&self, user_id: UserId, enabled: bool) -> Result<()> {
        let mut users = self.lock()?;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AuthError::DatabaseError("No such user".to_string()))?;
        user.mfa_enabled = enabled;
        Ok(())
    }

    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<()> {
        let mut users = self.lock()?;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AuthError::DatabaseError("No such user".to_string()))?;
        user.last_login = Some(at);
        Ok(())
    }

    async fn set_password_hash(&self, user_id: UserId, password_hash: &str) -> Result<()> {
        let mut users = self.lock()?;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AuthError::DatabaseError("No such user".to_string()))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}
