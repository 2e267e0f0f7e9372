//! Session lifecycle service.
//!
//! Pairs the durable session repository with the read-through cache.
//! The repository is the source of truth; the cache only accelerates
//! validation. Every durable mutation is followed by a cache evict so
//! the next read re-derives the entry from the store, and cache entries
//! always carry the store-computed remaining lifetime as their TTL.
//!
//! Read-path degradation: any cache error or timeout falls through to
//! the durable store. Cache *evictions* after a revocation propagate
//! their errors, because a stale entry there would keep a revoked
//! session usable until its TTL ran out. Evictions after a refresh or
//! MFA completion are best-effort instead: the replaced entry only
//! under-states the row (earlier expiry, pending sessions are never
//! cached), so a failed evict degrades freshness, not correctness.
//! Every cache call, evictions included, is bounded by the configured
//! cache timeout.

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::providers::{SessionCache, SessionRepository};
use crate::state::{
    CachedSession, DeviceInfo, Session, SessionDescriptor, SessionId, SessionSummary, TokenPair,
    UserId,
};
use chrono::Utc;
use std::net::IpAddr;
use tokio::time::timeout;

/// Session store front: durable repository plus read-through cache.
#[derive(Clone)]
pub struct SessionService<R, C> {
    repo: R,
    cache: C,
    config: AuthConfig,
}

impl<R, C> SessionService<R, C>
where
    R: SessionRepository,
    C: SessionCache,
{
    /// Create a new session service.
    pub const fn new(repo: R, cache: C, config: AuthConfig) -> Self {
        Self {
            repo,
            cache,
            config,
        }
    }

    /// Create and persist a new session.
    ///
    /// The session starts MFA-pending or fully verified depending on
    /// `mfa_verified`; only verified sessions are cached, since pending
    /// ones cannot authorize requests anyway.
    ///
    /// # Errors
    ///
    /// Returns error if the durable insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        tokens: TokenPair,
        ip_address: IpAddr,
        user_agent: String,
        device_info: DeviceInfo,
        mfa_verified: bool,
    ) -> Result<Session> {
        let now = Utc::now();
        let session = Session {
            session_id: SessionId::generate(),
            user_id,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            ip_address,
            user_agent,
            device_info,
            is_active: true,
            mfa_verified,
            is_suspicious: false,
            suspicious_reason: None,
            created_at: now,
            last_activity: now,
            expires_at: now + self.config.session_lifetime,
        };

        self.repo.insert(&session).await?;

        if mfa_verified {
            self.cache_best_effort(&session, self.config.session_lifetime_secs())
                .await;
        }

        tracing::info!(
            session_id = %session.session_id.0,
            user_id = %user_id.0,
            mfa_verified = mfa_verified,
            "Session created"
        );

        Ok(session)
    }

    /// Validate a session for request authorization.
    ///
    /// Cache-first: a fresh cache hit answers without touching the
    /// durable store. On miss, error or timeout the durable store
    /// decides, the row's `last_activity` is touched and the cache is
    /// repopulated with the store-computed remaining TTL.
    ///
    /// A session validates only when it is active, MFA-verified and
    /// unexpired.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionNotFound`] for missing, revoked or
    ///   MFA-pending sessions
    /// - [`AuthError::SessionExpired`] for expired ones
    /// - [`AuthError::DatabaseError`] if the durable store fails
    pub async fn validate(&self, session_id: &SessionId) -> Result<SessionDescriptor> {
        match timeout(self.config.cache_timeout, self.cache.get(session_id)).await {
            Ok(Ok(Some(cached))) => {
                let now = Utc::now();
                if cached.expires_at <= now {
                    // The entry outlived the row somehow (clock skew,
                    // TTL manipulation). Clean up and revoke.
                    tracing::warn!(
                        session_id = %session_id.0,
                        "Expired session found in cache, revoking"
                    );
                    self.end(session_id).await?;
                    return Err(AuthError::SessionExpired);
                }
                if !cached.mfa_verified {
                    return Err(AuthError::SessionNotFound);
                }

                Ok(SessionDescriptor {
                    session_id: session_id.clone(),
                    user_id: cached.user_id,
                    mfa_verified: cached.mfa_verified,
                    created_at: cached.created_at,
                    expires_at: cached.expires_at,
                })
            }
            Ok(Ok(None)) => self.validate_against_store(session_id).await,
            Ok(Err(e)) => {
                tracing::warn!(
                    session_id = %session_id.0,
                    error = %e,
                    "Cache read failed, falling through to durable store"
                );
                self.validate_against_store(session_id).await
            }
            Err(_) => {
                tracing::warn!(
                    session_id = %session_id.0,
                    timeout_ms = self.config.cache_timeout.as_millis() as u64,
                    "Cache read timed out, falling through to durable store"
                );
                self.validate_against_store(session_id).await
            }
        }
    }

    /// Mark the MFA step complete for a pending session.
    ///
    /// Returns the updated row. The cache entry is refreshed so the
    /// session can authorize immediately.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionNotFound`] / [`AuthError::SessionExpired`]
    ///   when the session no longer qualifies
    pub async fn complete_mfa(&self, session_id: &SessionId) -> Result<Session> {
        let Some(session) = self.repo.set_mfa_verified(session_id).await? else {
            return Err(self.classify_unusable(session_id).await?);
        };

        // The durable flip already happened; a cache outage must not
        // strand the caller without their session.
        self.evict_best_effort(session_id).await;
        if let Some((_, remaining)) = self.repo.fetch_active(session_id).await? {
            self.cache_best_effort(&session, remaining).await;
        }

        Ok(session)
    }

    /// Rotate the bearer tokens and extend the session window.
    ///
    /// One atomic durable update; losers of a concurrent race observe
    /// the session as already rotated and get the winner's row replayed
    /// to them only through a fresh validate, never here.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionNotFound`] / [`AuthError::SessionExpired`]
    ///   when the session no longer qualifies
    pub async fn rotate(&self, session_id: &SessionId, tokens: &TokenPair) -> Result<Session> {
        let Some(session) = self
            .repo
            .rotate_tokens(
                session_id,
                &tokens.access_token,
                &tokens.refresh_token,
                self.config.session_lifetime_secs(),
            )
            .await?
        else {
            return Err(self.classify_unusable(session_id).await?);
        };

        // The rotation is durably committed; the new pair must reach
        // the caller even when the cache is down.
        self.evict_best_effort(session_id).await;
        self.cache_best_effort(&session, self.config.session_lifetime_secs())
            .await;

        tracing::info!(session_id = %session_id.0, "Session tokens rotated");

        Ok(session)
    }

    /// Push the session window out to now + lifetime without touching
    /// the tokens, in one atomic durable update.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionNotFound`] / [`AuthError::SessionExpired`]
    ///   when the session no longer qualifies
    pub async fn extend(&self, session_id: &SessionId) -> Result<Session> {
        let Some(session) = self
            .repo
            .extend(session_id, self.config.session_lifetime_secs())
            .await?
        else {
            return Err(self.classify_unusable(session_id).await?);
        };

        self.evict_best_effort(session_id).await;
        self.cache_best_effort(&session, self.config.session_lifetime_secs())
            .await;

        Ok(session)
    }

    /// Soft-revoke a session. Idempotent: ending an already-ended or
    /// missing session succeeds.
    ///
    /// # Errors
    ///
    /// Returns error if the durable update or the cache evict fails.
    pub async fn end(&self, session_id: &SessionId) -> Result<()> {
        let revoked = self.repo.end(session_id).await?;
        self.evict_entry(session_id).await?;

        if revoked {
            tracing::info!(session_id = %session_id.0, "Session ended");
        }

        Ok(())
    }

    /// Soft-revoke all of a user's sessions, optionally sparing one.
    ///
    /// Returns the revoked session ids.
    ///
    /// # Errors
    ///
    /// Returns error if the durable update or a cache evict fails.
    pub async fn end_all(
        &self,
        user_id: UserId,
        except: Option<&SessionId>,
    ) -> Result<Vec<SessionId>> {
        let ended = self.repo.end_all_for_user(user_id, except).await?;

        for session_id in &ended {
            self.evict_entry(session_id).await?;
        }

        Ok(ended)
    }

    /// List a user's active sessions for UI display, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the durable query fails.
    pub async fn list_active(&self, user_id: UserId) -> Result<Vec<SessionSummary>> {
        let now = Utc::now();
        let sessions = self.repo.list_active(user_id).await?;

        Ok(sessions
            .into_iter()
            .map(|s| SessionSummary {
                is_expiring_soon: s.expires_at - now < self.config.expiring_soon,
                session_id: s.session_id,
                ip_address: s.ip_address,
                device_info: s.device_info,
                created_at: s.created_at,
                last_activity: s.last_activity,
                expires_at: s.expires_at,
                is_suspicious: s.is_suspicious,
            })
            .collect())
    }

    /// Annotate a session as suspicious. Annotation only; the session
    /// keeps working until something revokes it.
    ///
    /// # Errors
    ///
    /// Returns error if the durable update fails.
    pub async fn mark_suspicious(&self, session_id: &SessionId, reason: &str) -> Result<()> {
        self.repo.mark_suspicious(session_id, reason).await
    }

    /// Hard-delete session rows past the retention window. Returns the
    /// number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns error if the durable delete fails.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        self.repo.delete_expired().await
    }

    /// Fetch the raw session row (revoked and pending rows included).
    ///
    /// # Errors
    ///
    /// Returns error if the durable query fails.
    pub async fn fetch(&self, session_id: &SessionId) -> Result<Option<Session>> {
        self.repo.fetch(session_id).await
    }

    /// Durable-store validation path.
    async fn validate_against_store(&self, session_id: &SessionId) -> Result<SessionDescriptor> {
        let Some((session, remaining)) = self.repo.fetch_active(session_id).await? else {
            return Err(self.classify_unusable(session_id).await?);
        };

        if !session.mfa_verified {
            return Err(AuthError::SessionNotFound);
        }

        if let Err(e) = self.repo.touch(session_id).await {
            tracing::warn!(session_id = %session_id.0, error = %e, "Failed to touch session");
        }

        self.cache_best_effort(&session, remaining).await;

        Ok(SessionDescriptor::from(&session))
    }

    /// Distinguish expired from missing/revoked for a session the
    /// active-row query rejected.
    async fn classify_unusable(&self, session_id: &SessionId) -> Result<AuthError> {
        match self.repo.fetch(session_id).await? {
            Some(session) if session.is_active && session.expires_at <= Utc::now() => {
                Ok(AuthError::SessionExpired)
            }
            _ => Ok(AuthError::SessionNotFound),
        }
    }

    /// Bounded cache evict. Errors and timeouts surface to the caller:
    /// after a revocation a stale entry would keep the session usable,
    /// so those evicts must not pass silently.
    async fn evict_entry(&self, session_id: &SessionId) -> Result<()> {
        timeout(self.config.cache_timeout, self.cache.evict(session_id))
            .await
            .map_err(|_| AuthError::CacheError("Cache evict timed out".to_string()))?
    }

    /// Evict for mutations where the replaced entry only under-states
    /// the row; a failure costs freshness, never correctness.
    async fn evict_best_effort(&self, session_id: &SessionId) {
        if let Err(e) = self.evict_entry(session_id).await {
            tracing::warn!(
                session_id = %session_id.0,
                error = %e,
                "Failed to evict cached session view"
            );
        }
    }

    /// Cache writes never fail the primary operation.
    async fn cache_best_effort(&self, session: &Session, remaining_secs: i64) {
        #[allow(clippy::cast_sign_loss)]
        let ttl_secs = remaining_secs.max(0) as u64;
        let cached = CachedSession::from_session(session);

        let put = timeout(
            self.config.cache_timeout,
            self.cache.put(&session.session_id, &cached, ttl_secs),
        )
        .await;

        match put {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    session_id = %session.session_id.0,
                    error = %e,
                    "Failed to cache session view"
                );
            }
            Err(_) => {
                tracing::warn!(
                    session_id = %session.session_id.0,
                    "Timed out caching session view"
                );
            }
        }
    }
}
