//! Token issuer trait.

use crate::error::Result;
use crate::state::{TokenPair, UserId};

/// Token Service client.
///
/// Issues the opaque bearer token pair stored alongside each session.
/// The session store and orchestrator never inspect or decode the
/// tokens; they only store, return and compare them.
pub trait TokenIssuer: Send + Sync {
    /// Issue a fresh access/refresh token pair for a user.
    ///
    /// # Errors
    ///
    /// Returns error if the token service is unavailable.
    fn issue(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<TokenPair>> + Send;

    /// Invalidate a previously issued access token.
    ///
    /// Called best-effort at logout; the session row's soft-revoke is
    /// the authoritative revocation.
    ///
    /// # Errors
    ///
    /// Returns error if the token service is unavailable.
    fn invalidate(
        &self,
        access_token: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
