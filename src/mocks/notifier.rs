//! Mock notification sender for testing.

use crate::error::{AuthError, Result};
use crate::providers::NotificationSender;
use chrono::Duration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock notification sender.
///
/// Records everything it is asked to deliver so tests can read the code
/// back, and can be switched into a failing mode to exercise the
/// delivery-failure policy.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    /// `(recipient, code)` pairs, in send order.
    codes: Arc<Mutex<Vec<(String, String)>>>,
    /// `(recipient, subject)` pairs, in send order.
    alerts: Arc<Mutex<Vec<(String, String)>>>,
    /// When set, every send fails.
    failing: Arc<AtomicBool>,
}

impl MockNotifier {
    /// Create a new mock notifier that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch delivery failures on or off.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The most recently delivered code, if any.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn last_code(&self) -> Result<Option<String>> {
        Ok(self
            .codes
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .last()
            .map(|(_, code)| code.clone()))
    }

    /// Number of codes delivered so far.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn code_count(&self) -> Result<usize> {
        Ok(self
            .codes
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .len())
    }

    /// Subjects of security alerts delivered so far.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn alert_subjects(&self) -> Result<Vec<String>> {
        Ok(self
            .alerts
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .iter()
            .map(|(_, subject)| subject.clone())
            .collect())
    }
}

impl NotificationSender for MockNotifier {
    async fn send_mfa_code(
        &self,
        to: &str,
        _display_name: &str,
        code: &str,
        _expires_in: Duration,
    ) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::EmailDeliveryFailed);
        }

        self.codes
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .push((to.to_string(), code.to_string()));
        Ok(())
    }

    async fn send_security_alert(&self, to: &str, subject: &str, _message: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::EmailDeliveryFailed);
        }

        self.alerts
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}
