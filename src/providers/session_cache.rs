//! Session read-through cache trait.

use crate::error::Result;
use crate::state::{CachedSession, SessionId};

/// Fast-cache for session validation.
///
/// Strictly an accelerator over the durable store: entries are always
/// derived from a just-read durable row, and their TTL never exceeds
/// the row's remaining lifetime. A cache outage degrades validation
/// latency, never correctness: callers fall through to the store on
/// any cache error or timeout.
pub trait SessionCache: Send + Sync {
    /// Cache a derived session view with the given TTL in seconds.
    ///
    /// The TTL must be the store-computed remaining lifetime, so the
    /// entry can never outlive the durable row.
    ///
    /// # Errors
    ///
    /// Returns error if the cache backend is unavailable.
    fn put(
        &self,
        session_id: &SessionId,
        cached: &CachedSession,
        ttl_secs: u64,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Look up a cached session view.
    ///
    /// Returns `None` on miss (including entries the cache already
    /// expired).
    ///
    /// # Errors
    ///
    /// Returns error if the cache backend is unavailable.
    fn get(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<CachedSession>>> + Send;

    /// Remove a cached session view.
    ///
    /// Must be invoked after every durable mutation (revoke, refresh,
    /// MFA completion) so the next validation re-reads the store.
    ///
    /// # Errors
    ///
    /// Returns error if the cache backend is unavailable.
    fn evict(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
