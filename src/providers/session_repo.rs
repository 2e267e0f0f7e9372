//! Durable session repository trait.

use crate::error::Result;
use crate::state::{Session, SessionId, UserId};

/// Durable session store, the sole source of truth for session state.
///
/// Every mutation happens here first, as a single atomic statement on
/// the session row; cache maintenance follows. Implementations must use
/// the store's own clock for expiry arithmetic so remaining-lifetime
/// computations never trust an application clock.
pub trait SessionRepository: Send + Sync {
    /// Persist a freshly created session row.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails (including session-id
    /// collisions, which are not retried here).
    fn insert(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fetch a session row regardless of its state.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn fetch(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<Session>>> + Send;

    /// Fetch an active, unexpired session together with its remaining
    /// lifetime in whole seconds, both judged by the store clock.
    ///
    /// Returns `None` for missing, revoked or expired rows.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn fetch_active(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<(Session, i64)>>> + Send;

    /// Update `last_activity` to the store's current time.
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    fn touch(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Push the expiry out to now + `lifetime_secs` (store clock), in
    /// one atomic update. Only applies to active, unexpired rows.
    ///
    /// Returns the updated row, or `None` if the session was not
    /// extendable.
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    fn extend(
        &self,
        session_id: &SessionId,
        lifetime_secs: i64,
    ) -> impl std::future::Future<Output = Result<Option<Session>>> + Send;

    /// Mark the MFA step complete, in one atomic update. Only applies
    /// to active, unexpired rows.
    ///
    /// Returns the updated row, or `None` if no such row qualified.
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    fn set_mfa_verified(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<Session>>> + Send;

    /// Replace both bearer tokens and push the expiry out to now +
    /// `lifetime_secs`, in one atomic update. Only applies to active,
    /// unexpired rows.
    ///
    /// Returns the updated row, or `None` if no such row qualified.
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    fn rotate_tokens(
        &self,
        session_id: &SessionId,
        access_token: &str,
        refresh_token: &str,
        lifetime_secs: i64,
    ) -> impl std::future::Future<Output = Result<Option<Session>>> + Send;

    /// Soft-revoke a session (`is_active = false`). Idempotent: returns
    /// `false` when the row was already inactive or missing.
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    fn end(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Soft-revoke every active session of a user, optionally sparing
    /// one (the caller's own). Returns the ids that were revoked so the
    /// caller can evict their cache entries.
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    fn end_all_for_user(
        &self,
        user_id: UserId,
        except: Option<&SessionId>,
    ) -> impl std::future::Future<Output = Result<Vec<SessionId>>> + Send;

    /// List a user's active, unexpired sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn list_active(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Session>>> + Send;

    /// Annotate a session as suspicious with a reason. Annotation only;
    /// never revokes.
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    fn mark_suspicious(
        &self,
        session_id: &SessionId,
        reason: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Hard-delete rows expired past the retention window. Returns the
    /// number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns error if the delete fails.
    fn delete_expired(&self) -> impl std::future::Future<Output = Result<u64>> + Send;
}
