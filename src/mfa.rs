//! MFA code management.
//!
//! Issues six-digit one-time codes, delivers them through the
//! notification sender and verifies submissions against the single live
//! challenge per user. The login-time issue is free; only resends count
//! against the resend window, and failed verifications count against
//! their own lockout window.

use crate::config::{AuthConfig, DeliveryFailurePolicy};
use crate::constants::MFA_CODE_DIGITS;
use crate::error::{AuthError, Result};
use crate::providers::{MfaStore, NotificationSender};
use crate::state::{UserId, UserRecord};
use constant_time_eq::constant_time_eq;
use rand::Rng;

/// MFA code manager.
#[derive(Clone)]
pub struct MfaCodeManager<M, N> {
    store: M,
    notifier: N,
    config: AuthConfig,
}

impl<M, N> MfaCodeManager<M, N>
where
    M: MfaStore,
    N: NotificationSender,
{
    /// Create a new MFA code manager.
    pub const fn new(store: M, notifier: N, config: AuthConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Issue a fresh code for a user and deliver it.
    ///
    /// This is the login-time issue and does not count against the
    /// resend window; [`Self::resend`] does. A new code replaces any
    /// live one, so at most one challenge exists per user. Returns the
    /// code's time-to-live for the caller's response payload.
    ///
    /// # Errors
    ///
    /// - [`AuthError::EmailDeliveryFailed`] when delivery fails under the
    ///   [`DeliveryFailurePolicy::Fail`] policy (the stored code is
    ///   discarded so an undelivered code can never verify)
    /// - [`AuthError::CacheError`] if the challenge store is unavailable
    pub async fn issue(&self, user: &UserRecord) -> Result<chrono::Duration> {
        let code = generate_code();
        let ttl = self.config.mfa_code_ttl;

        #[allow(clippy::cast_sign_loss)]
        let ttl_std = std::time::Duration::from_secs(ttl.num_seconds().max(0) as u64);
        self.store.put_code(user.user_id, &code, ttl_std).await?;

        if let Err(e) = self
            .notifier
            .send_mfa_code(&user.email, &user.display_name(), &code, ttl)
            .await
        {
            match self.config.delivery_failure {
                DeliveryFailurePolicy::Fail => {
                    // An undelivered code must not stay verifiable.
                    if let Err(del_err) = self.store.delete_code(user.user_id).await {
                        tracing::warn!(
                            user_id = %user.user_id.0,
                            error = %del_err,
                            "Failed to discard undelivered MFA code"
                        );
                    }
                    tracing::warn!(
                        user_id = %user.user_id.0,
                        error = %e,
                        "MFA code delivery failed"
                    );
                    return Err(AuthError::EmailDeliveryFailed);
                }
                DeliveryFailurePolicy::LogOnly => {
                    tracing::warn!(
                        user_id = %user.user_id.0,
                        error = %e,
                        "MFA code delivery failed, keeping challenge live per policy"
                    );
                }
            }
        }

        Ok(ttl)
    }

    /// Reissue the code at the user's request.
    ///
    /// Counts against the resend window first, then issues exactly like
    /// [`Self::issue`]. A locked-out window rejects before any code is
    /// generated or sent.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TooManyAttempts`] when the resend window is exhausted
    /// - plus everything [`Self::issue`] returns
    pub async fn resend(&self, user: &UserRecord) -> Result<chrono::Duration> {
        let resend_count = self
            .store
            .incr_resends(user.user_id, self.config.mfa_resend_window)
            .await?;

        if resend_count > self.config.mfa_max_resends {
            tracing::warn!(
                user_id = %user.user_id.0,
                resend_count = resend_count,
                "MFA resend limit exceeded"
            );
            return Err(AuthError::TooManyAttempts {
                retry_after: self.config.mfa_resend_window,
            });
        }

        self.issue(user).await
    }

    /// Verify a submitted code against the user's live challenge.
    ///
    /// A correct code consumes the challenge and resets the failure
    /// counter. A wrong code counts toward the failure window; the
    /// comparison is constant-time.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TooManyAttempts`] when the failure window is exhausted
    /// - [`AuthError::CodeExpired`] when no live challenge exists
    /// - [`AuthError::CodeMismatch`] when the code is wrong
    /// - [`AuthError::CacheError`] if the challenge store is unavailable
    pub async fn verify(&self, user_id: UserId, submitted: &str) -> Result<()> {
        let failures = self.store.failure_count(user_id).await?;
        if failures >= self.config.mfa_max_failures {
            tracing::warn!(
                user_id = %user_id.0,
                failures = failures,
                "MFA verification locked out"
            );
            return Err(AuthError::TooManyAttempts {
                retry_after: self.config.mfa_failure_window,
            });
        }

        let Some(expected) = self.store.get_code(user_id).await? else {
            return Err(AuthError::CodeExpired);
        };

        if !constant_time_eq(expected.as_bytes(), submitted.as_bytes()) {
            let new_count = self
                .store
                .incr_failures(user_id, self.config.mfa_failure_window)
                .await?;
            tracing::info!(
                user_id = %user_id.0,
                failures = new_count,
                "MFA code mismatch"
            );
            return Err(AuthError::CodeMismatch);
        }

        // Consume the challenge so the code can never be replayed.
        self.store.delete_code(user_id).await?;
        if let Err(e) = self.store.clear_failures(user_id).await {
            tracing::warn!(user_id = %user_id.0, error = %e, "Failed to clear MFA failure counter");
        }

        Ok(())
    }
}

/// Generate a zero-padded numeric code of [`MFA_CODE_DIGITS`] digits.
fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..10_u32.pow(MFA_CODE_DIGITS));
    format!("{n:0width$}", width = MFA_CODE_DIGITS as usize)
}
