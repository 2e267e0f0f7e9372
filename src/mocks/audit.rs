//! Mock audit sink for testing.

use crate::error::{AuthError, Result};
use crate::providers::{AuditSink, SecurityEvent};
use crate::state::UserId;
use std::sync::{Arc, Mutex};

/// Mock audit sink.
///
/// Records every event so tests can assert that state transitions were
/// audited.
#[derive(Debug, Clone, Default)]
pub struct MockAuditSink {
    events: Arc<Mutex<Vec<SecurityEvent>>>,
}

impl MockAuditSink {
    /// Create a new mock audit sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in order.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn events(&self) -> Result<Vec<SecurityEvent>> {
        Ok(self
            .events
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .clone())
    }

    /// Recorded action names, in order.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn actions(&self) -> Result<Vec<String>> {
        Ok(self.events()?.into_iter().map(|e| e.action).collect())
    }
}

impl AuditSink for MockAuditSink {
    async fn log_action(
        &self,
        user_id: UserId,
        action: &str,
        detail: serde_json::Value,
    ) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .push(SecurityEvent::new(
                Some(user_id),
                action,
                None,
                detail.to_string(),
            ));
        Ok(())
    }

    async fn log_security_event(&self, event: &SecurityEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .push(event.clone());
        Ok(())
    }
}
