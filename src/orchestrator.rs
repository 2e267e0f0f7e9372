//! Authentication orchestrator.
//!
//! Drives the end-to-end flows (login, MFA verification, request
//! authorization, token refresh, logout and password change) by
//! composing the credential verifier, the MFA code manager and the
//! session service. Every state transition lands in the audit sink;
//! audit failures are logged and never block the user-facing operation.

use crate::config::AuthConfig;
use crate::constants::audit_actions;
use crate::error::{AuthError, Result};
use crate::mfa::MfaCodeManager;
use crate::providers::{
    AuditSink, MfaStore, NotificationSender, SecurityEvent, SessionCache, SessionRepository,
    TokenIssuer, UserDirectory,
};
use crate::session::SessionService;
use crate::state::{
    Session, SessionDescriptor, SessionId, SessionSummary, TokenPair, UserId, UserProfile,
    UserRecord,
};
use crate::utils::{device_info_from_request, mask_email};
use crate::verifier::CredentialVerifier;
use chrono::Utc;
use constant_time_eq::constant_time_eq;
use std::net::IpAddr;

/// Result of a successful login call.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Credentials verified and no MFA required: the session is live.
    Complete {
        /// Descriptor of the new session.
        session: SessionDescriptor,
        /// Bearer tokens for the client.
        tokens: TokenPair,
        /// Profile of the signed-in user.
        profile: UserProfile,
    },

    /// Credentials verified but the MFA step is pending. The session
    /// exists in the durable store and cannot authorize requests until
    /// [`AuthOrchestrator::verify_mfa`] completes it.
    MfaRequired {
        /// Pending session identifier to hand back on the verify call.
        session_id: SessionId,
        /// Masked email the code was sent to, for UI display.
        masked_email: String,
        /// Code time-to-live for the UI countdown.
        expires_in: chrono::Duration,
    },
}

/// Authentication orchestrator.
///
/// Generic over every collaborator so tests run the full flows against
/// in-memory fakes. Providers must be `Clone` because the orchestrator
/// shares them between its components.
#[derive(Clone)]
pub struct AuthOrchestrator<U, N, A, T, R, C, M> {
    verifier: CredentialVerifier<U, A>,
    mfa: MfaCodeManager<M, N>,
    sessions: SessionService<R, C>,
    directory: U,
    notifier: N,
    audit: A,
    tokens: T,
    mfa_store: M,
    cache: C,
    repo: R,
    config: AuthConfig,
}

impl<U, N, A, T, R, C, M> AuthOrchestrator<U, N, A, T, R, C, M>
where
    U: UserDirectory + Clone,
    N: NotificationSender + Clone,
    A: AuditSink + Clone,
    T: TokenIssuer,
    R: SessionRepository + Clone,
    C: SessionCache + Clone,
    M: MfaStore + Clone,
{
    /// Build an orchestrator from its providers.
    ///
    /// # Errors
    ///
    /// Returns error if the credential verifier cannot initialize.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        directory: U,
        notifier: N,
        audit: A,
        tokens: T,
        repo: R,
        cache: C,
        mfa_store: M,
        config: AuthConfig,
    ) -> Result<Self> {
        let verifier =
            CredentialVerifier::new(directory.clone(), audit.clone(), config.clone())?;
        let mfa = MfaCodeManager::new(mfa_store.clone(), notifier.clone(), config.clone());
        let sessions = SessionService::new(repo.clone(), cache.clone(), config.clone());

        Ok(Self {
            verifier,
            mfa,
            sessions,
            directory,
            notifier,
            audit,
            tokens,
            mfa_store,
            cache,
            repo,
            config,
        })
    }

    /// Swap in a new configuration without restarting.
    ///
    /// Rebuilds the components so the new thresholds apply to every
    /// flow from the next call on.
    ///
    /// # Errors
    ///
    /// Returns error if the credential verifier cannot re-initialize.
    pub fn reload_config(&mut self, config: AuthConfig) -> Result<()> {
        self.verifier = CredentialVerifier::new(
            self.directory.clone(),
            self.audit.clone(),
            config.clone(),
        )?;
        self.mfa = MfaCodeManager::new(
            self.mfa_store.clone(),
            self.notifier.clone(),
            config.clone(),
        );
        self.sessions = SessionService::new(self.repo.clone(), self.cache.clone(), config.clone());
        self.config = config;

        tracing::info!("Authentication configuration reloaded");
        Ok(())
    }

    /// The configuration currently in force.
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════
    // Login / MFA
    // ═══════════════════════════════════════════════════════════════

    /// Log in with email and password.
    ///
    /// Users without MFA get a live session immediately. Users with MFA
    /// get a pending session and a code by email; the login completes
    /// in [`Self::verify_mfa`].
    ///
    /// Device name and type are derived from the user agent; country
    /// and city are passed through when the caller resolved them
    /// upstream.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] (also covers locked and
    ///   suspended accounts at the public surface)
    /// - [`AuthError::EmailDeliveryFailed`] when the code cannot be sent
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ip_address: IpAddr,
        user_agent: &str,
        country: Option<String>,
        city: Option<String>,
    ) -> Result<LoginOutcome> {
        let user = self.verifier.verify(email, password, Some(ip_address)).await?;
        let tokens = self.tokens.issue(user.user_id).await?;

        let device_info = device_info_from_request(user_agent, country, city);

        if !user.mfa_enabled {
            let session = self
                .sessions
                .create(
                    user.user_id,
                    tokens.clone(),
                    ip_address,
                    user_agent.to_string(),
                    device_info,
                    true,
                )
                .await?;

            self.record_login(&user).await;
            self.audit_event(SecurityEvent::new(
                Some(user.user_id),
                audit_actions::LOGIN_SUCCEEDED,
                Some(ip_address),
                "password login, MFA not required",
            ))
            .await;

            return Ok(LoginOutcome::Complete {
                session: SessionDescriptor::from(&session),
                tokens,
                profile: user.profile(),
            });
        }

        let session = self
            .sessions
            .create(
                user.user_id,
                tokens,
                ip_address,
                user_agent.to_string(),
                device_info,
                false,
            )
            .await?;

        let expires_in = match self.mfa.issue(&user).await {
            Ok(ttl) => ttl,
            Err(e) => {
                // No code is coming; the pending session would just rot.
                if let Err(end_err) = self.sessions.end(&session.session_id).await {
                    tracing::warn!(
                        session_id = %session.session_id.0,
                        error = %end_err,
                        "Failed to end pending session after MFA issue failure"
                    );
                }
                return Err(e);
            }
        };

        self.audit_event(SecurityEvent::new(
            Some(user.user_id),
            audit_actions::MFA_CODE_ISSUED,
            Some(ip_address),
            "code issued at login",
        ))
        .await;

        Ok(LoginOutcome::MfaRequired {
            session_id: session.session_id,
            masked_email: mask_email(&user.email),
            expires_in,
        })
    }

    /// Complete the MFA step for a pending session.
    ///
    /// A correct code consumes the challenge, marks the session
    /// verified and returns the tokens issued at login.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionNotFound`] / [`AuthError::SessionExpired`]
    ///   when the pending session no longer qualifies
    /// - [`AuthError::CodeExpired`] / [`AuthError::CodeMismatch`]
    /// - [`AuthError::TooManyAttempts`] when the failure window is spent
    pub async fn verify_mfa(
        &self,
        session_id: &SessionId,
        code: &str,
        ip_address: Option<IpAddr>,
    ) -> Result<(SessionDescriptor, TokenPair, UserProfile)> {
        let pending = self.pending_session(session_id).await?;

        if let Err(e) = self.mfa.verify(pending.user_id, code).await {
            let action = if e.is_rate_limited() {
                audit_actions::MFA_LOCKOUT
            } else {
                audit_actions::MFA_FAILED
            };
            self.audit_event(SecurityEvent::new(
                Some(pending.user_id),
                action,
                ip_address,
                e.to_string(),
            ))
            .await;
            return Err(e);
        }

        let session = self.sessions.complete_mfa(session_id).await?;

        let user = self
            .directory
            .get_by_id(session.user_id)
            .await?
            .ok_or_else(|| AuthError::InternalError("User vanished mid-login".to_string()))?;

        self.record_login(&user).await;
        self.audit_event(SecurityEvent::new(
            Some(session.user_id),
            audit_actions::MFA_VERIFIED,
            ip_address,
            "MFA step completed",
        ))
        .await;

        let tokens = TokenPair {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
        };

        Ok((SessionDescriptor::from(&session), tokens, user.profile()))
    }

    /// Resend the MFA code for a pending session.
    ///
    /// Issues a fresh code (replacing the live one) and counts against
    /// the resend window; the login-time issue does not. Returns the
    /// new code's time-to-live.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionNotFound`] / [`AuthError::SessionExpired`]
    /// - [`AuthError::TooManyAttempts`] when the resend window is spent
    /// - [`AuthError::EmailDeliveryFailed`]
    pub async fn resend_mfa(
        &self,
        session_id: &SessionId,
        ip_address: Option<IpAddr>,
    ) -> Result<chrono::Duration> {
        let pending = self.pending_session(session_id).await?;

        let user = self
            .directory
            .get_by_id(pending.user_id)
            .await?
            .ok_or_else(|| AuthError::InternalError("User vanished mid-login".to_string()))?;

        match self.mfa.resend(&user).await {
            Ok(ttl) => {
                self.audit_event(SecurityEvent::new(
                    Some(user.user_id),
                    audit_actions::MFA_CODE_ISSUED,
                    ip_address,
                    "code resent",
                ))
                .await;
                Ok(ttl)
            }
            Err(e) => {
                if e.is_rate_limited() {
                    self.audit_event(SecurityEvent::new(
                        Some(user.user_id),
                        audit_actions::MFA_LOCKOUT,
                        ip_address,
                        "resend window exhausted",
                    ))
                    .await;
                }
                Err(e)
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Authorization / refresh
    // ═══════════════════════════════════════════════════════════════

    /// Validate a session for request authorization.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionNotFound`] for missing, revoked or
    ///   MFA-pending sessions
    /// - [`AuthError::SessionExpired`]
    pub async fn authorize(&self, session_id: &SessionId) -> Result<SessionDescriptor> {
        self.sessions.validate(session_id).await
    }

    /// Rotate the bearer tokens of a live session.
    ///
    /// The presented refresh token must match the stored one
    /// (constant-time). Rotation extends the session window.
    ///
    /// # Errors
    ///
    /// - [`AuthError::RefreshTokenInvalid`] on mismatch
    /// - [`AuthError::SessionNotFound`] / [`AuthError::SessionExpired`]
    pub async fn refresh(
        &self,
        session_id: &SessionId,
        refresh_token: &str,
        ip_address: Option<IpAddr>,
    ) -> Result<(SessionDescriptor, TokenPair)> {
        let Some(session) = self.sessions.fetch(session_id).await? else {
            return Err(AuthError::SessionNotFound);
        };

        let now = Utc::now();
        if !session.is_active || !session.mfa_verified {
            return Err(AuthError::SessionNotFound);
        }
        if session.expires_at <= now {
            return Err(AuthError::SessionExpired);
        }

        if !constant_time_eq(session.refresh_token.as_bytes(), refresh_token.as_bytes()) {
            self.audit_event(SecurityEvent::new(
                Some(session.user_id),
                audit_actions::REFRESH_REJECTED,
                ip_address,
                "refresh token mismatch",
            ))
            .await;
            return Err(AuthError::RefreshTokenInvalid);
        }

        let new_tokens = self.tokens.issue(session.user_id).await?;
        let rotated = self.sessions.rotate(session_id, &new_tokens).await?;

        // The old access token is dead either way; revocation at the
        // token service is best-effort.
        if let Err(e) = self.tokens.invalidate(&session.access_token).await {
            tracing::warn!(
                session_id = %session_id.0,
                error = %e,
                "Failed to invalidate rotated-out access token"
            );
        }

        Ok((SessionDescriptor::from(&rotated), new_tokens))
    }

    // ═══════════════════════════════════════════════════════════════
    // Logout / account actions
    // ═══════════════════════════════════════════════════════════════

    /// End a session. Idempotent: logging out an already-ended or
    /// unknown session succeeds.
    ///
    /// # Errors
    ///
    /// Returns error if the durable store or the cache evict fails.
    pub async fn logout(&self, session_id: &SessionId, ip_address: Option<IpAddr>) -> Result<()> {
        let session = self.sessions.fetch(session_id).await?;

        self.sessions.end(session_id).await?;

        if let Some(session) = session {
            if let Err(e) = self.tokens.invalidate(&session.access_token).await {
                tracing::warn!(
                    session_id = %session_id.0,
                    error = %e,
                    "Failed to invalidate access token at logout"
                );
            }
            self.audit_event(SecurityEvent::new(
                Some(session.user_id),
                audit_actions::LOGOUT,
                ip_address,
                "session ended",
            ))
            .await;
        }

        Ok(())
    }

    /// End every session of a user except, optionally, the caller's
    /// own. Returns the number of sessions revoked.
    ///
    /// # Errors
    ///
    /// Returns error if the durable store or a cache evict fails.
    pub async fn logout_all(
        &self,
        user_id: UserId,
        except: Option<&SessionId>,
        ip_address: Option<IpAddr>,
    ) -> Result<usize> {
        let ended = self.sessions.end_all(user_id, except).await?;

        self.audit_event(SecurityEvent::new(
            Some(user_id),
            audit_actions::LOGOUT_ALL,
            ip_address,
            format!("{} sessions ended", ended.len()),
        ))
        .await;

        Ok(ended.len())
    }

    /// Change a user's password.
    ///
    /// Requires the current password. On success every other session of
    /// the user is revoked, the caller's own survives, and a security
    /// alert goes out to the account email.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] when the current password is
    ///   wrong (or the account is in bad standing)
    /// - [`AuthError::DatabaseError`] if any durable write fails
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
        current_session: &SessionId,
        ip_address: Option<IpAddr>,
    ) -> Result<()> {
        let user = self
            .directory
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // Re-verifies the current password with the same generic error
        // surface as login.
        self.verifier
            .verify(&user.email, current_password, ip_address)
            .await?;

        let new_hash = self.verifier.hash_password(new_password).await?;
        self.directory.set_password_hash(user_id, &new_hash).await?;

        let ended = self
            .sessions
            .end_all(user_id, Some(current_session))
            .await?;

        if let Err(e) = self
            .notifier
            .send_security_alert(
                &user.email,
                "Your password was changed",
                "Your password was just changed and all other devices were signed out. \
                 If this wasn't you, contact support immediately.",
            )
            .await
        {
            tracing::warn!(
                user_id = %user_id.0,
                error = %e,
                "Failed to send password-change alert"
            );
        }

        self.audit_event(SecurityEvent::new(
            Some(user_id),
            audit_actions::PASSWORD_CHANGED,
            ip_address,
            format!("password changed, {} other sessions revoked", ended.len()),
        ))
        .await;

        Ok(())
    }

    /// Toggle the MFA requirement for a user.
    ///
    /// # Errors
    ///
    /// Returns error if the directory update fails.
    pub async fn set_mfa_enabled(
        &self,
        user_id: UserId,
        enabled: bool,
        ip_address: Option<IpAddr>,
    ) -> Result<()> {
        self.directory.set_mfa_enabled(user_id, enabled).await?;

        self.audit_event(SecurityEvent::new(
            Some(user_id),
            audit_actions::MFA_SETTING_CHANGED,
            ip_address,
            if enabled { "MFA enabled" } else { "MFA disabled" },
        ))
        .await;

        Ok(())
    }

    /// List a user's active sessions for the devices page.
    ///
    /// # Errors
    ///
    /// Returns error if the durable query fails.
    pub async fn list_sessions(&self, user_id: UserId) -> Result<Vec<SessionSummary>> {
        self.sessions.list_active(user_id).await
    }

    /// Annotate a session as suspicious. The session keeps working; the
    /// flag is for operators and the UI.
    ///
    /// # Errors
    ///
    /// Returns error if the durable update fails.
    pub async fn flag_suspicious(&self, session_id: &SessionId, reason: &str) -> Result<()> {
        self.sessions.mark_suspicious(session_id, reason).await?;

        if let Some(session) = self.sessions.fetch(session_id).await? {
            self.audit_event(SecurityEvent::new(
                Some(session.user_id),
                audit_actions::SESSION_FLAGGED,
                None,
                reason,
            ))
            .await;
        }

        Ok(())
    }

    /// Hard-delete session rows past the retention window.
    ///
    /// # Errors
    ///
    /// Returns error if the durable delete fails.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.sessions.cleanup_expired().await
    }

    // ═══════════════════════════════════════════════════════════════
    // Internals
    // ═══════════════════════════════════════════════════════════════

    /// Load a session that must be live and still waiting on its MFA
    /// step.
    async fn pending_session(&self, session_id: &SessionId) -> Result<Session> {
        let Some(session) = self.sessions.fetch(session_id).await? else {
            return Err(AuthError::SessionNotFound);
        };

        if !session.is_active || session.mfa_verified {
            return Err(AuthError::SessionNotFound);
        }
        if session.expires_at <= Utc::now() {
            return Err(AuthError::SessionExpired);
        }

        Ok(session)
    }

    /// Best-effort last-login bookkeeping.
    async fn record_login(&self, user: &UserRecord) {
        if let Err(e) = self.directory.record_login(user.user_id, Utc::now()).await {
            tracing::warn!(user_id = %user.user_id.0, error = %e, "Failed to record last login");
        }
    }

    /// Best-effort audit; an audit outage never blocks authentication.
    async fn audit_event(&self, event: SecurityEvent) {
        if let Err(e) = self.audit.log_security_event(&event).await {
            tracing::warn!(action = %event.action, error = %e, "Failed to record audit event");
        }
    }
}
