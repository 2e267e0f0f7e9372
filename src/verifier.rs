//! Credential verification.
//!
//! Validates email/password pairs against the user directory. All
//! failure modes collapse into the generic invalid-credentials error at
//! the API surface; the audit trail keeps the real reason.

use crate::config::AuthConfig;
use crate::constants::audit_actions;
use crate::error::{AuthError, Result};
use crate::providers::{AuditSink, SecurityEvent, UserDirectory};
use crate::state::{AccountStatus, UserRecord};
use crate::utils::{is_valid_email, normalize_email};
use std::net::IpAddr;

/// Credential verifier.
///
/// Generic over the user directory and audit sink so tests can run it
/// against in-memory fakes.
#[derive(Clone)]
pub struct CredentialVerifier<U, A> {
    directory: U,
    audit: A,
    config: AuthConfig,
    /// Hash compared against on the short-circuit paths (malformed or
    /// unknown email, bad account status) so every outcome costs one
    /// bcrypt round.
    dummy_hash: String,
}

impl<U, A> CredentialVerifier<U, A>
where
    U: UserDirectory,
    A: AuditSink,
{
    /// Create a new credential verifier.
    ///
    /// Precomputes the dummy hash used to equalize timing for unknown
    /// emails, which takes one bcrypt round at the configured cost.
    ///
    /// # Errors
    ///
    /// Returns error if the dummy hash cannot be computed.
    pub fn new(directory: U, audit: A, config: AuthConfig) -> Result<Self> {
        let dummy_hash = bcrypt::hash("timing-equalizer", config.bcrypt_cost)
            .map_err(|e| AuthError::InternalError(format!("Failed to compute dummy hash: {e}")))?;

        Ok(Self {
            directory,
            audit,
            config,
            dummy_hash,
        })
    }

    /// Verify an email/password pair.
    ///
    /// Returns the full user record on success. Unknown email, wrong
    /// password and bad account status all come back as errors whose
    /// [`public_message`](AuthError::public_message) is identical, so
    /// the surface cannot be used to enumerate accounts; the specific
    /// variant is recorded in the audit trail.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] for malformed or unknown
    ///   email, or wrong password
    /// - [`AuthError::AccountLocked`] / [`AuthError::AccountSuspended`]
    ///   for accounts in bad standing, checked before the password so
    ///   the audit trail records the status, not the password outcome
    /// - [`AuthError::DatabaseError`] if the directory is unavailable
    pub async fn verify(
        &self,
        email: &str,
        password: &str,
        ip_address: Option<IpAddr>,
    ) -> Result<UserRecord> {
        let email = normalize_email(email);

        if !is_valid_email(&email) {
            Self::compare_hash(password, &self.dummy_hash).await?;

            self.audit_failure(None, ip_address, "malformed email").await;
            return Err(AuthError::InvalidCredentials);
        }

        let Some(user) = self.directory.find_by_email(&email).await? else {
            // Burn a bcrypt round so an unknown email costs the same as
            // a wrong password.
            Self::compare_hash(password, &self.dummy_hash).await?;

            self.audit_failure(None, ip_address, "unknown email").await;
            return Err(AuthError::InvalidCredentials);
        };

        match user.status {
            AccountStatus::Active => {}
            AccountStatus::Locked => {
                Self::compare_hash(password, &self.dummy_hash).await?;

                self.audit_failure(Some(&user), ip_address, "account locked")
                    .await;
                return Err(AuthError::AccountLocked);
            }
            AccountStatus::Suspended => {
                Self::compare_hash(password, &self.dummy_hash).await?;

                self.audit_failure(Some(&user), ip_address, "account suspended")
                    .await;
                return Err(AuthError::AccountSuspended);
            }
        }

        let password_ok = Self::compare_hash(password, &user.password_hash).await?;
        if !password_ok {
            self.audit_failure(Some(&user), ip_address, "wrong password")
                .await;
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Hash a new password at the configured cost.
    ///
    /// # Errors
    ///
    /// Returns error if hashing fails.
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.config.bcrypt_cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::InternalError(format!("Hash task failed: {e}")))?
            .map_err(|e| AuthError::InternalError(format!("Failed to hash password: {e}")))
    }

    /// Run the bcrypt comparison off the async runtime. Cost 12 takes a
    /// few hundred milliseconds and must not stall the executor.
    async fn compare_hash(password: &str, hash: &str) -> Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::InternalError(format!("Hash task failed: {e}")))?
            .map_err(|e| AuthError::InternalError(format!("Failed to verify password: {e}")))
    }

    /// Best-effort failure audit; an audit outage never blocks login.
    async fn audit_failure(&self, user: Option<&UserRecord>, ip: Option<IpAddr>, reason: &str) {
        let event = SecurityEvent::new(
            user.map(|u| u.user_id),
            audit_actions::LOGIN_FAILED,
            ip,
            reason,
        );

        if let Err(e) = self.audit.log_security_event(&event).await {
            tracing::warn!(error = %e, "Failed to record login failure audit event");
        }
    }
}
