//! Mock token issuer for testing.

use crate::error::{AuthError, Result};
use crate::providers::TokenIssuer;
use crate::state::{TokenPair, UserId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Mock token issuer.
///
/// Issues sequential, predictable token pairs and records which access
/// tokens were invalidated.
#[derive(Debug, Clone, Default)]
pub struct MockTokenIssuer {
    counter: Arc<AtomicU64>,
    invalidated: Arc<Mutex<Vec<String>>>,
}

impl MockTokenIssuer {
    /// Create a new mock token issuer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access tokens invalidated so far, in order.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn invalidated(&self) -> Result<Vec<String>> {
        Ok(self
            .invalidated
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .clone())
    }
}

impl TokenIssuer for MockTokenIssuer {
    async fn issue(&self, user_id: UserId) -> Result<TokenPair> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(TokenPair {
            access_token: format!("access-{}-{n}", user_id.0),
            refresh_token: format!("refresh-{}-{n}", user_id.0),
        })
    }

    async fn invalidate(&self, access_token: &str) -> Result<()> {
        self.invalidated
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .push(access_token.to_string());
        Ok(())
    }
}
