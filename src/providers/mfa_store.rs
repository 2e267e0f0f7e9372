//! MFA challenge and counter store trait.

use crate::error::Result;
use crate::state::UserId;
use std::time::Duration;

/// Ephemeral store for MFA codes and abuse counters.
///
/// All state here is keyed by user and bounded by TTL; nothing
/// survives its window. A lost code is recovered by resend, never by
/// store repair.
pub trait MfaStore: Send + Sync {
    /// Store the live code for a user, replacing any previous one in
    /// the same write (single-flight invariant).
    ///
    /// # Errors
    ///
    /// Returns error if the store is unavailable.
    fn put_code(
        &self,
        user_id: UserId,
        code: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fetch the live code for a user, `None` if expired or absent.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unavailable.
    fn get_code(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// Delete the live code (consume on success, or discard on
    /// delivery failure).
    ///
    /// # Errors
    ///
    /// Returns error if the store is unavailable.
    fn delete_code(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Increment the failed-verification counter and return the new
    /// count. The first increment in a window starts the window's TTL.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unavailable.
    fn incr_failures(
        &self,
        user_id: UserId,
        window: Duration,
    ) -> impl std::future::Future<Output = Result<u32>> + Send;

    /// Current failed-verification count (0 if the window lapsed).
    ///
    /// # Errors
    ///
    /// Returns error if the store is unavailable.
    fn failure_count(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<u32>> + Send;

    /// Reset the failed-verification counter after a successful verify.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unavailable.
    fn clear_failures(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Increment the issue/resend counter and return the new count.
    /// The first increment in a window starts the window's TTL.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unavailable.
    fn incr_resends(
        &self,
        user_id: UserId,
        window: Duration,
    ) -> impl std::future::Future<Output = Result<u32>> + Send;
}
